//! Properties of the assembled capacitance matrices.

mod common;

use ndarray::Array2;
use sheath_core::poisson::PoissonSolver;

use common::build_serial;

/// A single tagged node at the centre of a 4³ domain: eight surface nodes,
/// an 8×8 symmetric positive store.
#[test]
fn central_node_matrix_is_symmetric_with_positive_sum() {
    let mut setup = build_serial([4, 4, 4], &[([2, 2, 2], 1.0)]);
    assert_eq!(setup.objects.surface_total(0), 8);

    let cap = setup.objects.capacitance(0);
    let inv = &cap.inv;
    let scale = inv.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    for i in 0..8 {
        for j in 0..8 {
            approx::assert_abs_diff_eq!(
                inv[[i, j]],
                inv[[j, i]],
                epsilon = 1e-6 * scale
            );
        }
    }
    assert!(cap.inv_sum_recip > 0.0);

    // Sanity: the correction scratch path works on the fresh store.
    setup.phi.zero();
    let potentials = setup
        .objects
        .apply_corrections(&mut setup.rho, &setup.phi, &setup.comm)
        .unwrap();
    assert_eq!(potentials.len(), 1);
}

/// A single tagged node in the upper true corner keeps only itself as a
/// surface node: the 1×1 store is a positive scalar with `S = 1/K`.
#[test]
fn corner_node_gives_a_one_by_one_positive_matrix() {
    let setup = build_serial([4, 4, 4], &[([4, 4, 4], 1.0)]);
    assert_eq!(setup.objects.surface_total(0), 1);

    let cap = setup.objects.capacitance(0);
    let k = cap.inv[[0, 0]];
    assert!(k > 0.0);
    approx::assert_relative_eq!(cap.inv_sum_recip, 1.0 / k, max_relative = 1e-12);
}

/// Round trip: the stored inverse times a freshly assembled capacitance
/// matrix is the identity, to within the solver tolerance.
#[test]
fn inverse_times_fresh_matrix_is_identity() {
    let mut setup = build_serial([6, 6, 6], &[([3, 3, 3], 1.0)]);
    let t = setup.objects.surface_total(0);
    assert_eq!(t, 8);

    // Re-assemble C column by column with unit charges, serial rank.
    let surface: Vec<usize> = setup.objects.surface().object(0).to_vec();
    let mut cap = Array2::<f64>::zeros((t, t));
    for (i, &charged) in surface.iter().enumerate() {
        setup.rho.zero();
        setup.rho[charged] = 1.0;
        setup
            .solver
            .solve(&setup.rho, &mut setup.phi, &setup.comm)
            .unwrap();
        for (j, &node) in surface.iter().enumerate() {
            cap[[j, i]] = setup.phi[node];
        }
    }

    let product = setup.objects.capacitance(0).inv.dot(&cap);
    let tol = 1e-6 * (t as f64).sqrt();
    for i in 0..t {
        for j in 0..t {
            let expected = if i == j { 1.0 } else { 0.0 };
            approx::assert_abs_diff_eq!(product[[i, j]], expected, epsilon = tol);
        }
    }
}

/// Two disjoint objects produce independent stores sized by their own
/// surface counts (the per-object, block-diagonal design).
#[test]
fn disjoint_objects_have_independent_stores() {
    let setup = build_serial(
        [6, 6, 6],
        &[([2, 2, 2], 1.0), ([6, 6, 6], 2.0)],
    );
    assert_eq!(setup.objects.n_objects(), 2);
    let t1 = setup.objects.surface_total(0);
    let t2 = setup.objects.surface_total(1);
    assert_eq!(setup.objects.capacitance(0).inv.nrows(), t1);
    assert_eq!(setup.objects.capacitance(1).inv.nrows(), t2);
    assert_eq!(t1, 8);
    // The corner object loses the candidates that fall in the ghost band.
    assert_eq!(t2, 1);
    assert!(setup.objects.capacitance(0).inv_sum_recip > 0.0);
    assert!(setup.objects.capacitance(1).inv_sum_recip > 0.0);
}
