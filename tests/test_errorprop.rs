mod common;

use approx::assert_abs_diff_eq;
use common::*;
use ndarray::{arr0, array, Array2};
use sicdproj::core::errorprop::{
    compute_composite_error_apo_bi, compute_composite_error_apo_mono,
    compute_composite_error_no_apo_bi, compute_composite_error_no_apo_mono, compute_ecef_pv_transformation,
    compute_i2s_error, compute_ric_basis_vectors, compute_s2i_error, ApoErrorParams,
    ComponentErrorStatBi, ComponentErrorStatMono, ErrorStatParams, ReferenceFrame,
};
use sicdproj::core::sensitivity::{
    compute_image_location_sensitivity_matrices, compute_slant_plane_sensitivity_matrices,
    SensitivityMatrices, SensitivityOptions,
};
use sicdproj::core::vector::{cross, dot, norm, scale};
use sicdproj::{compute_sensitivity_matrices, image_to_constant_hae_surface, SarError, SurfaceProjectionParams};

fn assert_symmetric(m: &Array2<f64>) {
    let scale = m.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    for i in 0..m.nrows() {
        assert!(m[[i, i]] >= 0.0, "negative variance {}", m[[i, i]]);
        for j in 0..m.ncols() {
            assert_abs_diff_eq!(m[[i, j]], m[[j, i]], epsilon = 1e-9 * scale);
        }
    }
}

fn assert_identity(m: &Array2<f64>, tol: f64) {
    for i in 0..m.nrows() {
        for j in 0..m.ncols() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_abs_diff_eq!(m[[i, j]], expected, epsilon = tol);
        }
    }
}

fn mono_sensitivity() -> sicdproj::core::sensitivity::SensitivityMatricesMono {
    let meta = create_monostatic_metadata();
    match compute_sensitivity_matrices(&meta, &SensitivityOptions::default()).unwrap() {
        SensitivityMatrices::Mono(sens) => sens,
        SensitivityMatrices::Bi(_) => panic!("expected monostatic sensitivity matrices"),
    }
}

fn bi_sensitivity() -> sicdproj::core::sensitivity::SensitivityMatricesBi {
    let meta = create_bistatic_metadata();
    match compute_sensitivity_matrices(&meta, &SensitivityOptions::default()).unwrap() {
        SensitivityMatrices::Bi(sens) => sens,
        SensitivityMatrices::Mono(_) => panic!("expected bistatic sensitivity matrices"),
    }
}

#[test]
fn test_sensitivity_inverse_pairs() {
    init_logging();
    for meta in [create_monostatic_metadata(), create_bistatic_metadata()] {
        let sens = compute_sensitivity_matrices(&meta, &SensitivityOptions::default()).unwrap();
        assert_eq!(sens.il0(), [0.0, 0.0]);

        let sp = sens.slant_plane();
        assert_identity(&sp.m_spxy_rrdot.dot(&sp.m_rrdot_spxy), 1e-9);
        assert_identity(&sp.m_gpxy_spxy.dot(&sp.m_spxy_gpxy), 1e-9);
        assert_identity(&sp.m_spxy_pt.dot(&sp.m_spxy_pt.t()), 1e-12);

        let il = sens.image_location();
        assert_identity(&il.m_il_rrdot.dot(&il.m_rrdot_il), 1e-9);
        assert_identity(&il.m_il_spxy.dot(&il.m_spxy_il), 1e-9);
        assert_eq!(il.m_il_pt.dim(), (2, 3));
    }
}

#[test]
fn test_image_location_follows_ground_displacement() {
    init_logging();
    // image plane is the ETP at the SCP with rows east and columns north
    let meta = create_monostatic_metadata();
    let (east, north, _) = scp_enu();
    let il = compute_image_location_sensitivity_matrices(&meta, None, None, None, None).unwrap();

    let m = &il.m_il_pt;
    let d_east = [dot(&[m[[0, 0]], m[[0, 1]], m[[0, 2]]], &east), dot(&[m[[1, 0]], m[[1, 1]], m[[1, 2]]], &east)];
    let d_north = [dot(&[m[[0, 0]], m[[0, 1]], m[[0, 2]]], &north), dot(&[m[[1, 0]], m[[1, 1]], m[[1, 2]]], &north)];
    assert_abs_diff_eq!(d_east[0], 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(d_east[1], 0.0, epsilon = 1e-3);
    assert_abs_diff_eq!(d_north[0], 0.0, epsilon = 1e-3);
    assert_abs_diff_eq!(d_north[1], 1.0, epsilon = 1e-3);
}

#[test]
fn test_sensitivity_at_scene_point() {
    init_logging();
    let meta = create_monostatic_metadata();
    let il = ndarray::Array::from_elem(vec![1], [100.0, -50.0]);
    let hae = arr0(meta.scp_hae()).into_dyn();
    let pt = image_to_constant_hae_surface(&meta, &il, &hae, &SurfaceProjectionParams::default()).unwrap();
    let pt0 = pt.points[[0]];

    let sens = compute_sensitivity_matrices(&meta, &SensitivityOptions::default().at_point(pt0)).unwrap();
    assert_abs_diff_eq!(sens.il0()[0], 100.0, epsilon = 1e-2);
    assert_abs_diff_eq!(sens.il0()[1], -50.0, epsilon = 1e-2);
    let (r, _) = sens.projection_set().r_rdot();
    assert!(r > 0.0);
}

#[test]
fn test_downward_surface_normal_is_rejected() {
    init_logging();
    let meta = create_monostatic_metadata();
    let (_, _, up) = scp_enu();
    let result = compute_slant_plane_sensitivity_matrices(&meta, None, Some(scale(&up, -1.0)));
    assert!(matches!(result, Err(SarError::InvalidParameter(_))));

    let steps = SensitivityOptions::default().with_steps(0.0, 1.0);
    assert!(compute_sensitivity_matrices(&meta, &steps).is_err());
}

#[test]
fn test_composite_error_mono() {
    init_logging();
    let sens = mono_sensitivity();
    let set0 = sens.set0;

    assert!(compute_composite_error_no_apo_mono(&set0, &sens, &ErrorStatParams::default())
        .unwrap()
        .is_none());

    let c_scp_rgaz = array![[0.5, 0.1], [0.1, 0.4]];
    let errstat = ErrorStatParams {
        c_scp_rgaz: Some(c_scp_rgaz.clone()),
        ..Default::default()
    };
    let passthrough = compute_composite_error_no_apo_mono(&set0, &sens, &errstat).unwrap();
    assert_eq!(passthrough, Some(c_scp_rgaz));

    let mut c_aif_apv = Array2::<f64>::eye(6);
    for k in 3..6 {
        c_aif_apv[[k, k]] = 0.01;
    }
    let mut errstat = ErrorStatParams {
        component_mono: Some(ComponentErrorStatMono {
            c_aif_apv,
            aif: ReferenceFrame::Ricf,
            var_rb: 0.25,
            var_clk_sf: 1e-18,
            var_trop: 0.04,
            var_iono: 0.01,
        }),
        ..Default::default()
    };
    let composite = compute_composite_error_no_apo_mono(&set0, &sens, &errstat).unwrap().unwrap();
    assert_eq!(composite.dim(), (2, 2));
    assert_symmetric(&composite);

    errstat.c_ui = Some(Array2::eye(2) * 0.25);
    let with_ui = compute_composite_error_no_apo_mono(&set0, &sens, &errstat).unwrap().unwrap();
    assert_symmetric(&with_ui);
    assert!(with_ui[[0, 0]] >= composite[[0, 0]]);
    assert!(with_ui[[1, 1]] >= composite[[1, 1]]);

    let bad = ErrorStatParams {
        c_scp_rgaz: Some(Array2::eye(3)),
        ..Default::default()
    };
    assert!(matches!(
        compute_composite_error_no_apo_mono(&set0, &sens, &bad),
        Err(SarError::InvalidShape(_))
    ));
}

#[test]
fn test_composite_error_mono_apo() {
    init_logging();
    let sens = mono_sensitivity();
    let set0 = sens.set0;
    assert!(compute_composite_error_apo_mono(&set0, &sens, &ApoErrorParams::default())
        .unwrap()
        .is_none());

    let apo_err = ApoErrorParams {
        c_apom: Some(Array2::eye(8) * 1e-6),
        ..Default::default()
    };
    let c = compute_composite_error_apo_mono(&set0, &sens, &apo_err).unwrap().unwrap();
    assert_symmetric(&c);
    assert!(c[[0, 0]] > 0.0);
}

#[test]
fn test_composite_error_bi() {
    init_logging();
    let meta = create_bistatic_metadata();
    let sens = bi_sensitivity();
    let set0 = sens.set0;
    let t_scp = meta.t_scp_coa;

    assert!(compute_composite_error_no_apo_bi(&set0, &sens, &ErrorStatParams::default(), t_scp)
        .unwrap()
        .is_none());

    let rrdot_only = ErrorStatParams {
        c_scp_rrdot: Some(array![[1.0, 0.0], [0.0, 0.01]]),
        ..Default::default()
    };
    let c = compute_composite_error_no_apo_bi(&set0, &sens, &rrdot_only, t_scp).unwrap().unwrap();
    assert_symmetric(&c);

    let components = ErrorStatParams {
        component_bi: Some(ComponentErrorStatBi {
            c_xif_xpv: Array2::eye(6),
            xif: ReferenceFrame::Rici,
            c_rif_rpv: Array2::eye(6) * 4.0,
            rif: ReferenceFrame::Ecf,
            cc_xif_rif_xpv_rpv: Array2::zeros((6, 6)),
            c_xrtf: Array2::eye(4) * 1e-18,
            c_atm: array![[0.01, 0.0], [0.0, 0.01]],
        }),
        ..Default::default()
    };
    let c = compute_composite_error_no_apo_bi(&set0, &sens, &components, t_scp).unwrap().unwrap();
    assert_symmetric(&c);
    assert!(c[[0, 0]] > 0.0);

    let apo_err = ApoErrorParams {
        c_apoxr: Some(Array2::eye(16) * 1e-6),
        ..Default::default()
    };
    let c = compute_composite_error_apo_bi(&set0, &sens, &apo_err, t_scp).unwrap().unwrap();
    assert_symmetric(&c);

    let bad = ApoErrorParams {
        c_apoxr: Some(Array2::eye(8)),
        ..Default::default()
    };
    assert!(compute_composite_error_apo_bi(&set0, &sens, &bad, t_scp).is_err());
}

#[test]
fn test_misshaped_sensitivity_matrices_are_rejected() {
    init_logging();
    let mut mono = mono_sensitivity();
    assert!(mono.validate().is_ok());
    let set0 = mono.set0;
    mono.slant_plane.m_spxy_rrdot = Array2::eye(3);
    let errstat = ErrorStatParams {
        c_scp_rgaz: Some(Array2::eye(2)),
        ..Default::default()
    };
    assert!(matches!(
        compute_composite_error_no_apo_mono(&set0, &mono, &errstat),
        Err(SarError::InvalidShape(_))
    ));

    let mut bi = bi_sensitivity();
    let set0 = bi.set0;
    bi.pvt.m_rrdot_delta_vrcv = Array2::zeros((3, 2));
    assert!(matches!(
        compute_composite_error_apo_bi(&set0, &bi, &ApoErrorParams::default(), 0.0),
        Err(SarError::InvalidShape(_))
    ));

    let mut sens = mono_sensitivity();
    sens.image_location.m_il_pt = Array2::zeros((3, 3));
    let sens = SensitivityMatrices::Mono(sens);
    assert!(matches!(
        compute_s2i_error(&Array2::zeros((2, 2)), &Array2::eye(3), &sens),
        Err(SarError::InvalidShape(_))
    ));
}

#[test]
fn test_image_to_scene_error() {
    init_logging();
    let sens = SensitivityMatrices::Mono(mono_sensitivity());
    let zeros = Array2::<f64>::zeros((2, 2));

    let c_hae = compute_i2s_error(&zeros, &zeros, 4.0, &sens).unwrap();
    let mil = &sens.slant_plane().mil_pt_hae;
    assert_eq!(c_hae.dim(), (3, 3));
    for k in 0..3 {
        assert_abs_diff_eq!(c_hae[[k, k]], 4.0 * mil[[k, 0]] * mil[[k, 0]], epsilon = 1e-9);
    }

    let c = compute_i2s_error(&Array2::eye(2), &(Array2::eye(2) * 0.25), 1.0, &sens).unwrap();
    assert_symmetric(&c);
    assert!(c.diag().sum() > c_hae.diag().sum() / 4.0);

    assert!(compute_i2s_error(&Array2::eye(3), &zeros, 1.0, &sens).is_err());
}

#[test]
fn test_scene_to_image_error() {
    init_logging();
    let sens = SensitivityMatrices::Mono(mono_sensitivity());
    let zero = compute_s2i_error(&Array2::zeros((2, 2)), &Array2::zeros((3, 3)), &sens).unwrap();
    assert!(zero.iter().all(|&v| v == 0.0));

    let c = compute_s2i_error(&Array2::zeros((2, 2)), &Array2::eye(3), &sens).unwrap();
    assert_symmetric(&c);
    // a unit scene error moves the image location at least as much in each axis
    assert!(c[[0, 0]] >= 0.99);
    assert!(c[[1, 1]] >= 0.99);
}

#[test]
fn test_ric_frames() {
    init_logging();
    let p = [7.0e6, 1.0e5, -2.0e5];
    let v = [100.0, 7500.0, 50.0];
    let (u_r, u_i, u_c) = compute_ric_basis_vectors(&p, &v);
    for u in [u_r, u_i, u_c] {
        assert_abs_diff_eq!(norm(&u), 1.0, epsilon = 1e-12);
    }
    assert_abs_diff_eq!(dot(&u_r, &u_i), 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(dot(&cross(&u_r, &u_i), &u_c), 1.0, epsilon = 1e-12);

    let ecf = compute_ecef_pv_transformation(&p, &v, ReferenceFrame::Ecf).unwrap();
    assert_identity(&ecf, 0.0);

    for frame in [ReferenceFrame::Ricf, ReferenceFrame::Rici] {
        let t = compute_ecef_pv_transformation(&p, &v, frame).unwrap();
        assert_eq!(t.dim(), (6, 6));
        let rot = t.slice(ndarray::s![0..3, 0..3]).to_owned();
        assert_identity(&rot.t().dot(&rot), 1e-12);
        // position does not depend on velocity
        assert!(t.slice(ndarray::s![0..3, 3..6]).iter().all(|&x| x == 0.0));
    }

    assert_eq!("RICI".parse::<ReferenceFrame>().unwrap(), ReferenceFrame::Rici);
    assert!("XYZ".parse::<ReferenceFrame>().is_err());
}
