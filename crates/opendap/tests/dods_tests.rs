//! Decoding tests against synthetic `.dods` bodies shaped like GrADS output.

use opendap::{decode_response, hyperslab, ArrayValues, Declaration, OpendapError};

fn push_len(body: &mut Vec<u8>, n: usize) {
    body.extend_from_slice(&(n as u32).to_be_bytes());
    body.extend_from_slice(&(n as u32).to_be_bytes());
}

fn push_f32s(body: &mut Vec<u8>, values: &[f32]) {
    push_len(body, values.len());
    for v in values {
        body.extend_from_slice(&v.to_be_bytes());
    }
}

fn push_f64s(body: &mut Vec<u8>, values: &[f64]) {
    push_len(body, values.len());
    for v in values {
        body.extend_from_slice(&v.to_be_bytes());
    }
}

const GRID_DDS: &str = "Dataset {
    Grid {
     ARRAY:
        Float32 tmp2m[time = 1][lat = 2][lon = 3];
     MAPS:
        Float64 time[time = 1];
        Float64 lat[lat = 2];
        Float64 lon[lon = 3];
    } tmp2m;
} gfs_0p25_1hr_00z;
";

fn grid_body() -> Vec<u8> {
    let mut body = GRID_DDS.as_bytes().to_vec();
    body.extend_from_slice(b"\nData:\n");
    push_f32s(&mut body, &[300.0, 301.0, 302.0, 303.0, 304.0, 9.999e20]);
    push_f64s(&mut body, &[738901.125]);
    push_f64s(&mut body, &[-6.0, -5.75]);
    push_f64s(&mut body, &[110.0, 110.25, 110.5]);
    body
}

// ============================================================================
// Grid responses
// ============================================================================

#[test]
fn test_grid_response_yields_array_then_maps() {
    let (dds, arrays) = decode_response(&grid_body()).unwrap();

    assert!(matches!(dds.find("tmp2m"), Some(Declaration::Grid { .. })));
    let names: Vec<&str> = arrays.iter().map(|a| a.name()).collect();
    assert_eq!(names, vec!["tmp2m", "time", "lat", "lon"]);

    assert_eq!(arrays[0].decl.shape(), vec![1, 2, 3]);
    match &arrays[0].values {
        ArrayValues::Float32(v) => {
            assert_eq!(v.len(), 6);
            assert_eq!(v[0], 300.0);
            assert_eq!(v[5], 9.999e20);
        }
        other => panic!("expected Float32 values, got {:?}", other),
    }
    assert_eq!(arrays[2].values.to_f64(), vec![-6.0, -5.75]);
}

#[test]
fn test_crlf_data_marker() {
    let mut body = b"Dataset {\r\n    Float64 lat[lat = 1];\r\n} d;\r\nData:\r\n".to_vec();
    push_f64s(&mut body, &[10.0]);
    let (_, arrays) = decode_response(&body).unwrap();
    assert_eq!(arrays[0].values.to_f32(), vec![10.0]);
}

// ============================================================================
// Malformed responses
// ============================================================================

#[test]
fn test_length_mismatch_is_rejected() {
    let mut body = GRID_DDS.as_bytes().to_vec();
    body.extend_from_slice(b"\nData:\n");
    push_f32s(&mut body, &[1.0, 2.0]);
    assert!(matches!(decode_response(&body), Err(OpendapError::Decode(_))));
}

#[test]
fn test_grads_error_document() {
    let body = b"Error {\n    code = 0;\n    message = \"subset requests must be contiguous\";\n};\n";
    let err = decode_response(body).unwrap_err();
    assert!(err.to_string().contains("subset requests must be contiguous"));
}

// ============================================================================
// Constraint building
// ============================================================================

#[test]
fn test_hyperslab_for_region_window() {
    let constraint = hyperslab("ugrd10m", &[5..6, 300..421, 360..601]);
    assert_eq!(constraint, "ugrd10m[5:5][300:420][360:600]");
}
