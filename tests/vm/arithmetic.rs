//! Integration tests for arithmetic and truthiness

use progsvm_foundation::{Cell, DefType, Vec3};
use progsvm_vm::{Opcode, ProgramBuilder};
use proptest::prelude::*;

use crate::{build, vm};

/// Runs `z = x op y` once over globals of the given types.
fn run(op: Opcode, tys: [DefType; 3], x: &[f32], y: &[f32]) -> Vec<f32> {
    let mut b = ProgramBuilder::new();
    let gx = b.global("x", tys[0]);
    let gy = b.global("y", tys[1]);
    let gz = b.global("z", tys[2]);
    let _ = b.function("op", &[]);
    b.emit(op, gx, gy, gz);
    b.emit(Opcode::Done, 0, 0, 0);
    b.end_function();
    let (program, f) = build(b, "op");
    let mut vm = vm(program);

    let cells = |v: &[f32]| v.iter().map(|&f| Cell::from_float(f)).collect::<Vec<_>>();
    vm.globals_mut().write_slice(gx as usize, &cells(x));
    vm.globals_mut().write_slice(gy as usize, &cells(y));
    vm.execute(f).unwrap();
    let width = tys[2].size();
    vm.globals()
        .slice(gz as usize..gz as usize + width)
        .iter()
        .map(|c| c.as_float())
        .collect()
}

fn vector() -> impl Strategy<Value = Vec3> {
    prop::array::uniform3(-1000.0f32..1000.0)
}

#[test]
fn scaled_vectors() {
    use DefType::{Float, Vector};
    assert_eq!(
        run(Opcode::MulFV, [Float, Vector, Vector], &[2.0], &[1.0, -2.0, 0.5]),
        vec![2.0, -4.0, 1.0]
    );
    assert_eq!(
        run(Opcode::MulVF, [Vector, Float, Vector], &[1.0, 2.0, 3.0], &[-1.0]),
        vec![-1.0, -2.0, -3.0]
    );
}

#[test]
fn not_f_of_zero_is_one() {
    use DefType::Float;
    assert_eq!(run(Opcode::NotF, [Float, Float, Float], &[0.0], &[0.0]), vec![1.0]);
    assert_eq!(run(Opcode::NotF, [Float, Float, Float], &[-3.0], &[0.0]), vec![0.0]);
}

proptest! {
    #[test]
    fn add_f_matches_host(a in -1e6f32..1e6, b in -1e6f32..1e6) {
        use DefType::Float;
        let z = run(Opcode::AddF, [Float, Float, Float], &[a], &[b]);
        prop_assert_eq!(z[0].to_bits(), (a + b).to_bits());
    }

    #[test]
    fn add_v_is_componentwise(u in vector(), v in vector()) {
        use DefType::Vector;
        let z = run(Opcode::AddV, [Vector, Vector, Vector], &u, &v);
        for i in 0..3 {
            prop_assert_eq!(z[i].to_bits(), (u[i] + v[i]).to_bits());
        }
    }

    #[test]
    fn mul_v_is_dot_product(u in vector(), v in vector()) {
        use DefType::{Float, Vector};
        let z = run(Opcode::MulV, [Vector, Vector, Float], &u, &v);
        let dot = u[0] * v[0] + u[1] * v[1] + u[2] * v[2];
        prop_assert_eq!(z[0].to_bits(), dot.to_bits());
    }

    #[test]
    fn comparisons_agree_with_host(a in -100.0f32..100.0, b in -100.0f32..100.0) {
        use DefType::Float;
        let truth = |v: bool| if v { 1.0 } else { 0.0 };
        let cases = [
            (Opcode::Lt, a < b),
            (Opcode::Le, a <= b),
            (Opcode::Gt, a > b),
            (Opcode::Ge, a >= b),
            (Opcode::EqF, a == b),
            (Opcode::NeF, a != b),
        ];
        for (op, expected) in cases {
            let z = run(op, [Float, Float, Float], &[a], &[b]);
            prop_assert_eq!(z[0], truth(expected));
        }
    }
}
