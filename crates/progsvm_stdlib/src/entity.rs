//! Entity builtins.

#![allow(clippy::cast_sign_loss)]

use progsvm_foundation::{EntityIndex, Result};
use progsvm_vm::Vm;

/// `spawn()`: allocates a cleared entity.
///
/// # Errors
///
/// Returns `LimitExceeded(Edicts)` if the table is full.
pub fn native_spawn(vm: &mut Vm) -> Result<()> {
    let entity = vm.allocate_entity()?;
    vm.return_entity(entity);
    Ok(())
}

/// `remove(e)`: frees an entity.
///
/// # Errors
///
/// Returns `ReservedEntity` for the world and other reserved records, and
/// `BadEntity` for records that do not exist.
pub fn native_remove(vm: &mut Vm) -> Result<()> {
    let entity = vm.get_entity(0);
    vm.free_entity(entity)
}

/// `find(start, .string field, match)`: the first entity after `start`
/// whose string field equals `match`, or the world.
///
/// Entities whose field holds the null string never match.
///
/// # Errors
///
/// Returns `BadField` if the field offset is outside the record.
pub fn native_find(vm: &mut Vm) -> Result<()> {
    let field = vm.get_int(1) as u32;
    let target = vm.get_string(2);
    let entities = vm.entities();

    let mut cursor = vm.get_entity(0);
    let mut found = EntityIndex::WORLD;
    while let Some(next) = entities.next_live(cursor) {
        let id = entities.get(next, field)?.as_string();
        if !id.is_null() && vm.string(id) == target {
            found = next;
            break;
        }
        cursor = next;
    }

    vm.return_entity(found);
    Ok(())
}

/// `nextent(e)`: the next entity in use after `e`, or the world.
///
/// # Errors
///
/// Never fails.
#[allow(clippy::unnecessary_wraps)]
pub fn native_nextent(vm: &mut Vm) -> Result<()> {
    let entity = vm.get_entity(0);
    let next = vm.entities().next_live(entity).unwrap_or(EntityIndex::WORLD);
    vm.return_entity(next);
    Ok(())
}
