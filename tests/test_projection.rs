mod common;

use approx::assert_abs_diff_eq;
use common::*;
use ndarray::{arr0, Array, ArrayD, Dimension};
use sicdproj::core::coa::{compute_coa_pos_vel, compute_coa_time, image_grid_to_image_plane_point};
use sicdproj::core::metadata::{IncaParams, PfaParams};
use sicdproj::core::poly::{Poly1d, Poly2d};
use sicdproj::core::projection::{
    compute_coa_r_rdot, compute_projection_set, compute_scp_coa_r_rdot,
    compute_scp_coa_slant_plane_normal, ProjectionSet,
};
use sicdproj::core::surface::r_rdot_to_ground_plane_bi;
use sicdproj::core::vector::{add_scaled, distance, dot, norm, sub};
use sicdproj::core::wgs84;
use sicdproj::core::CoaPosVels;
use sicdproj::{
    compute_projection_sets, image_to_constant_hae_surface, image_to_ground_plane,
    GridType, ImageFormationAlgorithm, ImageGridLocations, MetadataParams, ProjectionSets, SarError,
    SurfaceProjectionParams, Vec3,
};

fn create_test_grid() -> ImageGridLocations {
    Array::from_shape_fn(vec![2, 3, 4], |idx| {
        let (i, j, k) = (idx[0] as f64, idx[1] as f64, idx[2] as f64);
        [(i - 0.5) * 150.0 + k * 10.0, (j - 1.0) * 120.0 - k * 15.0]
    })
}

#[test]
fn test_scp_coa_is_consistent() {
    init_logging();
    for meta in [create_monostatic_metadata(), create_bistatic_metadata()] {
        let il = Array::from_elem(vec![1], [0.0, 0.0]);
        let t_coa = compute_coa_time(&meta.t_coa_poly, &il);
        assert_abs_diff_eq!(t_coa[[0]], T_SCP_COA, epsilon = 1e-12);

        let set = compute_projection_set(&meta, &[0.0, 0.0]).unwrap();
        let (r, rdot) = set.r_rdot();
        let (r_scp, rdot_scp) = compute_scp_coa_r_rdot(&meta);
        assert_abs_diff_eq!(r, r_scp, epsilon = 1e-6);
        assert_abs_diff_eq!(rdot, rdot_scp, epsilon = 1e-9);

        let spn = compute_scp_coa_slant_plane_normal(&meta);
        assert_abs_diff_eq!(norm(&spn), 1.0, epsilon = 1e-12);
        assert!(dot(&spn, &wgs84::up_at(&meta.scp)) > 0.0);
    }
}

#[test]
fn test_coa_pos_vel_matches_stored_state() {
    init_logging();
    let meta = create_monostatic_metadata();
    let mono = meta.monostatic().unwrap();
    let t = arr0(T_SCP_COA).into_dyn();
    let CoaPosVels::Mono(pv) = compute_coa_pos_vel(&meta, &t).unwrap() else {
        panic!("expected monostatic states");
    };
    let pv = pv.iter().next().copied().unwrap();
    assert_vec3_near(&pv.arp_coa, &mono.arp_scp_coa, 1e-6);
    assert_vec3_near(&pv.varp_coa, &mono.varp_scp_coa, 1e-9);

    let meta = create_bistatic_metadata();
    let bi = meta.bistatic().unwrap().clone();
    let CoaPosVels::Bi(pv) = compute_coa_pos_vel(&meta, &t).unwrap() else {
        panic!("expected bistatic states");
    };
    let pv = pv.iter().next().copied().unwrap();
    // signal leaves the transmitter before and reaches the receiver after COA
    assert!(pv.tx_coa < T_SCP_COA && pv.tr_coa > T_SCP_COA);
    assert_abs_diff_eq!(pv.tx_coa, bi.tx_scp_coa, epsilon = 1e-12);
    let expected_tx = T_SCP_COA - distance(&pv.xmt_coa, &meta.scp) / sicdproj::SPEED_OF_LIGHT;
    assert_abs_diff_eq!(pv.tx_coa, expected_tx, epsilon = 1e-9);
}

#[test]
fn test_every_r_rdot_method_is_finite() {
    init_logging();
    let base = create_monostatic_metadata();
    let il = create_test_grid();

    let variants = vec![
        base.clone(),
        base.clone().with_grid(GridType::Xrgycr, ImageFormationAlgorithm::Other),
        base.clone().with_grid(GridType::Xctyat, ImageFormationAlgorithm::Other),
        base.clone()
            .with_grid(GridType::Rgazim, ImageFormationAlgorithm::Rgazcomp)
            .with_rgazcomp(2.0),
        base.clone()
            .with_grid(GridType::Rgzero, ImageFormationAlgorithm::Rma)
            .with_inca(IncaParams {
                time_ca_poly: Poly1d::new(vec![1.0, 1e-4]),
                r_ca_scp: 10_000.0,
                drate_sf_poly: Poly2d::new(ndarray::array![[1.0, 1e-4], [1.0, 1e-4]]),
            }),
        base.clone()
            .with_grid(GridType::Rgazim, ImageFormationAlgorithm::Pfa)
            .with_pfa(PfaParams {
                polar_ang_poly: Poly1d::new(vec![0.0, 0.01]),
                spatial_freq_sf_poly: Poly1d::new(vec![1.0, 0.0]),
            }),
    ];

    for meta in variants {
        let t_coa = compute_coa_time(&meta.t_coa_poly, &il);
        let pos_vel = compute_coa_pos_vel(&meta, &t_coa).unwrap();
        let (r, rdot) = compute_coa_r_rdot(&meta, &il, &t_coa, &pos_vel).unwrap();
        assert_eq!(r.shape(), &[2, 3, 4]);
        assert!(r.iter().all(|v| v.is_finite() && *v > 0.0), "{:?}", meta.grid_type);
        assert!(rdot.iter().all(|v| v.is_finite()), "{:?}", meta.grid_type);
    }
}

#[test]
fn test_r_rdot_methods_at_grid_point() {
    init_logging();
    let base = create_monostatic_metadata();
    let mono = base.monostatic().unwrap().clone();
    let il = [30.0, -45.0];

    // linear track and tCOA = 2 + 1e-4 * ycol
    let t_coa = T_SCP_COA + 1e-4 * il[1];
    let varp = mono.varp_scp_coa;
    let arp = add_scaled(&mono.arp_scp_coa, t_coa - T_SCP_COA, &varp);
    let range_to = |pt: &Vec3| {
        let los = sub(&arp, pt);
        let r = norm(&los);
        (r, dot(&varp, &los) / r)
    };
    let (r_scp, rdot_scp) = range_to(&base.scp);
    let ipp = add_scaled(&add_scaled(&base.scp, il[0], &base.u_row), il[1], &base.u_col);
    let (r_ipp, rdot_ipp) = range_to(&ipp);

    let r_rdot = |meta: &MetadataParams| {
        let set = compute_projection_set(meta, &il).unwrap();
        assert_abs_diff_eq!(set.t_coa(), t_coa, epsilon = 1e-12);
        set.r_rdot()
    };

    for grid in [GridType::Plane, GridType::Xrgycr, GridType::Xctyat] {
        let (r, rdot) = r_rdot(&base.clone().with_grid(grid, ImageFormationAlgorithm::Other));
        assert_abs_diff_eq!(r, r_ipp, epsilon = 1e-6);
        assert_abs_diff_eq!(rdot, rdot_ipp, epsilon = 1e-9);
    }

    // R = R_SCP + xrow, Rdot = Rdot_SCP - |VARP| * AzSF * ycol
    let rgazcomp = base
        .clone()
        .with_grid(GridType::Rgazim, ImageFormationAlgorithm::Rgazcomp)
        .with_rgazcomp(2.0);
    let (r, rdot) = r_rdot(&rgazcomp);
    assert_abs_diff_eq!(r, r_scp + 30.0, epsilon = 1e-6);
    assert_abs_diff_eq!(rdot, rdot_scp + 9900.0, epsilon = 1e-8);

    // theta = 0.05 + 0.01 t, KSF = 1 + 0.2 theta
    let pfa = base
        .clone()
        .with_grid(GridType::Rgazim, ImageFormationAlgorithm::Pfa)
        .with_pfa(PfaParams {
            polar_ang_poly: Poly1d::new(vec![0.05, 0.01]),
            spatial_freq_sf_poly: Poly1d::new(vec![1.0, 0.2]),
        });
    let (r, rdot) = r_rdot(&pfa);
    assert_abs_diff_eq!(r - r_scp, 27.15591231136225, epsilon = 1e-7);
    assert_abs_diff_eq!(rdot - rdot_scp, -0.4228802543424438, epsilon = 1e-9);

    // tCA = 2 + 1e-3 xrow, DRSF = 1.2 + 1e-3 xrow, |VARP| = 110
    let inca = base
        .with_grid(GridType::Rgzero, ImageFormationAlgorithm::Rma)
        .with_inca(IncaParams {
            time_ca_poly: Poly1d::new(vec![2.0, 1e-3]),
            r_ca_scp: 21_540.0,
            drate_sf_poly: Poly2d::new(ndarray::array![[1.2, 0.0], [1e-3, 0.0]]),
        });
    let (r, rdot) = r_rdot(&inca);
    assert_abs_diff_eq!(r, 21570.00041062797, epsilon = 1e-6);
    assert_abs_diff_eq!(rdot, -0.023804519713731796, epsilon = 1e-10);
}

#[test]
fn test_unsupported_methods_are_errors() {
    init_logging();
    let il = create_test_grid();
    let missing = create_monostatic_metadata().with_grid(GridType::Rgzero, ImageFormationAlgorithm::Rma);
    assert!(matches!(compute_projection_sets(&missing, &il), Err(SarError::Metadata(_))));

    let bistatic_rgazcomp = create_bistatic_metadata()
        .with_grid(GridType::Rgazim, ImageFormationAlgorithm::Rgazcomp)
        .with_rgazcomp(1.0);
    assert!(compute_projection_sets(&bistatic_rgazcomp, &il).is_err());
}

#[test]
fn test_ground_plane_recovers_image_plane_point() {
    init_logging();
    // image plane is the ETP at the SCP, which is also the default ground plane
    let meta = create_monostatic_metadata();
    let il = create_test_grid();
    let projection =
        image_to_ground_plane(&meta, &il, None, None, &SurfaceProjectionParams::default()).unwrap();
    assert!(projection.all_converged());

    let ipp = image_grid_to_image_plane_point(&meta.scp, &meta.u_row, &meta.u_col, &il);
    for (gpp, expected) in projection.points.iter().zip(ipp.iter()) {
        assert_vec3_near(gpp, expected, 1e-4);
    }
}

#[test]
fn test_bistatic_solver_matches_monostatic_closed_form() {
    init_logging();
    let meta = create_monostatic_metadata();
    let il = create_test_grid();
    let sets = compute_projection_sets(&meta, &il).unwrap();
    let ProjectionSets::Mono(mono) = &sets else {
        panic!("expected monostatic sets");
    };

    let ugpn = wgs84::up_at(&meta.scp);
    let params = SurfaceProjectionParams {
        delta_gp_gpp: 1e-6,
        gpp_max_iterations: 20,
        ..Default::default()
    };
    let closed_form =
        sicdproj::core::surface::r_rdot_to_ground_plane(meta.look(), &meta.scp, &sets, &meta.scp, &ugpn, &params)
            .unwrap();
    let as_bi = mono.map(|s| s.as_bistatic());
    let iterated = r_rdot_to_ground_plane_bi(meta.look(), &meta.scp, &as_bi, &meta.scp, &ugpn, &params).unwrap();

    assert!(iterated.all_converged());
    for (a, b) in closed_form.points.iter().zip(iterated.points.iter()) {
        assert_vec3_near(a, b, 1e-6);
    }
}

#[test]
fn test_constant_hae_scalar_and_per_point() {
    init_logging();
    let params = SurfaceProjectionParams::default();
    let il = create_test_grid();

    for meta in [create_monostatic_metadata(), create_bistatic_metadata()] {
        let scalar = image_to_constant_hae_surface(&meta, &il, &arr0(150.0).into_dyn(), &params).unwrap();
        assert!(scalar.all_converged());
        assert_eq!(scalar.points.shape(), &[2, 3, 4]);
        for p in scalar.points.iter() {
            assert_abs_diff_eq!(wgs84::hae_of(p), 150.0, epsilon = 1e-5);
        }

        let hae0: ArrayD<f64> = Array::from_shape_fn(vec![2, 3, 4], |idx| 100.0 + 10.0 * idx[2] as f64);
        let per_point = image_to_constant_hae_surface(&meta, &il, &hae0, &params).unwrap();
        assert!(per_point.all_converged());
        for (p, h) in per_point.points.iter().zip(hae0.iter()) {
            assert_abs_diff_eq!(wgs84::hae_of(p), *h, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_constant_hae_isolates_corrupted_range() {
    init_logging();
    let il = create_test_grid();
    let params = SurfaceProjectionParams::default();
    let bad_index: [usize; 3] = [1, 2, 3];

    for meta in [create_monostatic_metadata(), create_bistatic_metadata()] {
        let hae0 = arr0(meta.scp_hae()).into_dyn();
        let sets = compute_projection_sets(&meta, &il).unwrap();
        let project = |sets: &ProjectionSets| {
            sicdproj::core::surface::r_rdot_to_constant_hae_surface(meta.look(), &meta.scp, sets, &hae0, &params)
                .unwrap()
        };
        let clean = project(&sets);
        assert!(clean.all_converged());

        let corrupted = match sets {
            ProjectionSets::Mono(mut mono) => {
                mono[bad_index].r_coa *= 1e6;
                ProjectionSets::Mono(mono)
            }
            ProjectionSets::Bi(mut bi) => {
                bi[bad_index].r_avg_coa *= 1e6;
                ProjectionSets::Bi(bi)
            }
        };
        let projection = project(&corrupted);

        assert!(!projection.all_converged());
        assert_eq!(projection.num_failed(), 1);
        assert!(!projection.success[bad_index]);
        for (idx, point) in projection.points.indexed_iter() {
            let idx = idx.slice();
            if idx == &bad_index[..] {
                assert_ne!(*point, clean.points[idx]);
            } else {
                assert_eq!(*point, clean.points[idx], "point {:?} changed", idx);
                assert!(projection.success[idx]);
            }
        }
    }
}

#[test]
fn test_hae_shape_mismatch_is_rejected() {
    init_logging();
    let meta = create_monostatic_metadata();
    let il = create_test_grid();
    let hae0 = Array::from_elem(vec![5], 0.0);
    let result = image_to_constant_hae_surface(&meta, &il, &hae0, &SurfaceProjectionParams::default());
    assert!(matches!(result, Err(SarError::InvalidShape(_))));
}

#[test]
fn test_projection_set_enum_accessors() {
    init_logging();
    let meta = create_bistatic_metadata();
    let sets = compute_projection_sets(&meta, &create_test_grid()).unwrap();
    assert!(!sets.is_monostatic());
    assert_eq!(sets.shape(), &[2, 3, 4]);
    match sets.get(&[1, 1, 1]) {
        Some(ProjectionSet::Bi(set)) => assert!(set.r_avg_coa > 0.0),
        other => panic!("unexpected projection set {:?}", other),
    }
    assert!(sets.get(&[2, 0, 0]).is_none());
}
