//! Synthetic collections shared by the integration tests
#![allow(dead_code)]

use sicdproj::core::coa::{compute_coa_pos_vel_at, CoaPosVel};
use sicdproj::core::geometry::compute_ref_point_parameters;
use sicdproj::core::metadata::{BistaticParams, CollectionGeometry, MonostaticParams};
use sicdproj::core::poly::{Poly2d, XyzPoly};
use sicdproj::core::vector::{add_scaled, scale, sub};
use sicdproj::core::wgs84;
use sicdproj::{MetadataParams, SideOfTrack, Vec3};
use ndarray::array;

pub const SCP_LLH: Vec3 = [30.0, -100.0, 200.0];
pub const T_SCP_COA: f64 = 2.0;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// East, north and up unit vectors at the SCP
pub fn scp_enu() -> (Vec3, Vec3, Vec3) {
    let params = compute_ref_point_parameters(&wgs84::geodetic_to_cartesian(&SCP_LLH));
    (params.u_east, params.u_north, params.u_up)
}

/// Straight-line platform passing `pos` at `T_SCP_COA` with velocity `vel`
fn linear_track(pos: &Vec3, vel: &Vec3) -> XyzPoly {
    let p0 = sub(pos, &scale(vel, T_SCP_COA));
    XyzPoly::from_rows(&[p0, *vel])
}

fn t_coa_poly() -> Poly2d {
    Poly2d::new(array![[T_SCP_COA, 1e-4], [0.0, 0.0]])
}

/// Airborne right-looking monostatic collection; the image plane is the ETP
/// at the SCP with rows along east
pub fn create_monostatic_metadata() -> MetadataParams {
    let scp = wgs84::geodetic_to_cartesian(&SCP_LLH);
    let (east, north, up) = scp_enu();

    let arp = add_scaled(&add_scaled(&scp, -20000.0, &east), 8000.0, &up);
    let varp = scale(&north, 110.0);

    let geometry = CollectionGeometry::Monostatic(MonostaticParams {
        arp_poly: linear_track(&arp, &varp),
        arp_scp_coa: arp,
        varp_scp_coa: varp,
    });

    MetadataParams::new(scp, east, north, 0.5, 0.6, t_coa_poly(), T_SCP_COA, SideOfTrack::Right, geometry)
        .expect("valid monostatic metadata")
}

/// Bistatic collection: the monostatic platform transmits, a second
/// airborne platform receives
pub fn create_bistatic_metadata() -> MetadataParams {
    let scp = wgs84::geodetic_to_cartesian(&SCP_LLH);
    let (east, north, up) = scp_enu();

    let xmt = add_scaled(&add_scaled(&scp, -20000.0, &east), 8000.0, &up);
    let vxmt = scale(&north, 110.0);
    let rcv = add_scaled(
        &add_scaled(&add_scaled(&scp, -12000.0, &east), -6000.0, &north),
        5000.0,
        &up,
    );
    let vrcv = add_scaled(&scale(&north, 80.0), 5.0, &east);

    let placeholder = BistaticParams {
        grp_poly: XyzPoly::from_rows(&[scp]),
        xmt_poly: linear_track(&xmt, &vxmt),
        rcv_poly: linear_track(&rcv, &vrcv),
        tx_scp_coa: T_SCP_COA,
        tr_scp_coa: T_SCP_COA,
        xmt_scp_coa: xmt,
        vxmt_scp_coa: vxmt,
        rcv_scp_coa: rcv,
        vrcv_scp_coa: vrcv,
    };
    let mut meta = MetadataParams::new(
        scp,
        east,
        north,
        0.5,
        0.6,
        t_coa_poly(),
        T_SCP_COA,
        SideOfTrack::Right,
        CollectionGeometry::Bistatic(placeholder),
    )
    .expect("valid bistatic metadata");

    // store the SCP COA states consistent with the polynomials
    let CoaPosVel::Bi(pv) = compute_coa_pos_vel_at(&meta, T_SCP_COA).expect("SCP COA state") else {
        panic!("bistatic metadata produced a monostatic state");
    };
    if let CollectionGeometry::Bistatic(bi) = &mut meta.geometry {
        bi.tx_scp_coa = pv.tx_coa;
        bi.tr_scp_coa = pv.tr_coa;
        bi.xmt_scp_coa = pv.xmt_coa;
        bi.vxmt_scp_coa = pv.vxmt_coa;
        bi.rcv_scp_coa = pv.rcv_coa;
        bi.vrcv_scp_coa = pv.vrcv_coa;
    }
    meta
}

pub fn assert_vec3_near(actual: &Vec3, expected: &Vec3, tol: f64) {
    for k in 0..3 {
        assert!(
            (actual[k] - expected[k]).abs() <= tol,
            "component {}: {:?} vs {:?} (tol {})",
            k,
            actual,
            expected,
            tol
        );
    }
}
