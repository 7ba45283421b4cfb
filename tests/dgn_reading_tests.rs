//! Reading synthetic design files: framing, decoding, index, extents and
//! the spatial filter.

mod common;

use common::builders::*;
use common::comparison::{assert_f64_eq, assert_vec3_eq};
use common::{element_ids, open_bytes, open_bytes_failsafe, read_all};
use dgnrust::io::dgn::{attr_link_size, get_linkage, ieee_to_vax, linkage_type, vax_to_ieee};
use dgnrust::{DgnError, DgnFile, ElementKind, NotificationType, Rgb, StructureType, Vector3};

const TOL: f64 = 1e-9;

// ===========================================================================
// Framing
// ===========================================================================

#[test]
fn test_end_marker_ends_iteration() {
    let mut dgn = open_bytes(vec![0xff, 0xff]);
    assert!(dgn.read_element().unwrap().is_none());
    assert!(dgn.read_element().unwrap().is_none());

    let mut dgn = open_bytes(design_file(&[tcb_2d()]));
    assert!(dgn.read_element().unwrap().is_some());
    assert!(dgn.read_element().unwrap().is_none());
}

#[test]
fn test_missing_end_marker_is_end_of_file() {
    let mut bytes = design_file(&[tcb_2d(), line_2d(1, [0, 0], [1, 1])]);
    bytes.truncate(bytes.len() - 2);
    let mut dgn = open_bytes(bytes);
    assert_eq!(read_all(&mut dgn).len(), 2);
}

#[test]
fn test_truncated_record_is_an_error() {
    let mut bytes = design_file(&[tcb_2d(), line_2d(1, [0, 0], [1, 1])]);
    bytes.truncate(bytes.len() - 12);
    let mut dgn = open_bytes(bytes);
    dgn.read_element().unwrap();
    assert!(matches!(
        dgn.read_element(),
        Err(DgnError::Truncated { expected: 52, .. })
    ));
}

#[test]
fn test_foreign_file_rejected() {
    let result = DgnFile::from_stream(std::io::Cursor::new(b"AC1015\0\0".to_vec()));
    assert!(matches!(result, Err(DgnError::InvalidHeader(_))));
}

// ===========================================================================
// Decoding
// ===========================================================================

#[test]
fn test_line_decodes_to_two_vertices() {
    let mut dgn = open_bytes(design_file(&[tcb_2d(), line_2d(5, [0, 0], [1000, 2000])]));
    let elements = read_all(&mut dgn);
    assert_eq!(elements.len(), 2);

    let line = &elements[1];
    assert_eq!(line.core.level, 5);
    assert_eq!(line.element_type(), 3);
    assert_eq!(line.structure_type(), StructureType::MultiPoint);

    let mp = line.as_multi_point().unwrap();
    assert_eq!(mp.vertices.len(), 2);
    assert_vec3_eq(&mp.vertices[0], &Vector3::ZERO, TOL);
    assert_vec3_eq(&mp.vertices[1], &Vector3::new(1000.0, 2000.0, 0.0), TOL);
}

#[test]
fn test_element_range_is_unbiased() {
    let mut dgn = open_bytes(design_file(&[tcb_2d(), line_2d(5, [-30, 0], [1000, 2000])]));
    dgn.read_element().unwrap();
    let line = dgn.read_element().unwrap().unwrap();

    let bounds = dgn.element_extents(&line).unwrap();
    assert_vec3_eq(&bounds.min, &Vector3::new(-30.0, 0.0, 0.0), TOL);
    assert_vec3_eq(&bounds.max, &Vector3::new(1000.0, 2000.0, 0.0), TOL);
}

#[test]
fn test_working_units_and_origin() {
    let units = SeedUnits {
        subunits_per_master: 10,
        uor_per_subunit: 100,
        origin: [500.0, 0.0, 0.0],
    };
    let mut dgn = open_bytes(design_file(&[
        tcb(false, units),
        line_2d(1, [1000, 0], [3000, 2000]),
    ]));
    let elements = read_all(&mut dgn);

    let tcb = elements[0].as_tcb().unwrap();
    assert_eq!(tcb.dimension, 2);
    assert_eq!(tcb.subunits_per_master, 10);
    assert_eq!(tcb.uor_per_subunit, 100);
    assert_eq!(tcb.master_units, "MU");
    assert_eq!(tcb.sub_units, "SU");
    assert_vec3_eq(&tcb.origin, &Vector3::new(0.5, 0.0, 0.0), TOL);

    assert_f64_eq(dgn.scale(), 0.001, 1e-15);
    let mp = elements[1].as_multi_point().unwrap();
    assert_vec3_eq(&mp.vertices[0], &Vector3::new(0.5, 0.0, 0.0), TOL);
    assert_vec3_eq(&mp.vertices[1], &Vector3::new(2.5, 2.0, 0.0), TOL);
}

#[test]
fn test_three_dimensional_file() {
    let mut raw = record(3, 2, 60);
    {
        let put = |raw: &mut Vec<u8>, at: usize, v: i32| {
            raw[at..at + 4].copy_from_slice(&dgnrust::io::dgn::cursor::encode_int32(v))
        };
        put(&mut raw, 36, 1);
        put(&mut raw, 40, 2);
        put(&mut raw, 44, 3);
        put(&mut raw, 48, -4);
        put(&mut raw, 52, -5);
        put(&mut raw, 56, -6);
    }
    let mut dgn = open_bytes(design_file(&[tcb(true, SeedUnits::default()), raw]));
    assert_eq!(dgn.dimension(), 3);

    let elements = read_all(&mut dgn);
    let mp = elements[1].as_multi_point().unwrap();
    assert_vec3_eq(&mp.vertices[0], &Vector3::new(1.0, 2.0, 3.0), TOL);
    assert_vec3_eq(&mp.vertices[1], &Vector3::new(-4.0, -5.0, -6.0), TOL);
}

#[test]
fn test_line_string_vertices() {
    let points = [[0, 0], [10, 0], [10, 10], [0, 10]];
    let mut dgn = open_bytes(design_file(&[tcb_2d(), line_string_2d(3, &points)]));
    let elements = read_all(&mut dgn);
    let mp = elements[1].as_multi_point().unwrap();
    assert_eq!(mp.num_vertices(), 4);
    assert_vec3_eq(&mp.vertices[2], &Vector3::new(10.0, 10.0, 0.0), TOL);
}

#[test]
fn test_color_table_replaces_palette() {
    let mut dgn = open_bytes(design_file(&[
        tcb_2d(),
        color_table(&[(1, [10, 20, 30]), (255, [1, 2, 3])]),
    ]));
    assert!(!dgn.got_color_table());
    let default_first = dgn.lookup_color(1);

    let elements = read_all(&mut dgn);
    assert_eq!(elements[1].structure_type(), StructureType::ColorTable);
    assert!(dgn.got_color_table());
    assert_eq!(dgn.lookup_color(1), Rgb::new(10, 20, 30));
    assert_eq!(dgn.lookup_color(255), Rgb::new(1, 2, 3));
    assert_ne!(default_first, dgn.lookup_color(1));
}

#[test]
fn test_unknown_type_keeps_raw_bytes() {
    let mut raw = record(99, 4, 40);
    raw[36] = 0xab;
    let mut dgn = open_bytes(design_file(&[tcb_2d(), raw.clone()]));
    let elements = read_all(&mut dgn);
    assert!(matches!(elements[1].kind, ElementKind::Core));
    assert_eq!(elements[1].core.raw_data, raw);
    assert_eq!(elements[1].core.type_name(), "99");
}

#[test]
fn test_deleted_elements_are_delivered() {
    let mut dgn = open_bytes(design_file(&[
        tcb_2d(),
        as_deleted(line_2d(1, [0, 0], [1, 1])),
        line_2d(1, [2, 2], [3, 3]),
    ]));
    let elements = read_all(&mut dgn);
    assert_eq!(elements.len(), 3);
    assert!(elements[1].core.deleted);
    assert!(!elements[2].core.deleted);
    let mp = elements[1].as_multi_point().unwrap();
    assert_vec3_eq(&mp.vertices[1], &Vector3::new(1.0, 1.0, 0.0), TOL);
}

#[test]
fn test_failsafe_skips_undecodable_records() {
    // a line string that declares a single vertex
    let mut bad = record(4, 1, 46);
    bad[36] = 1;
    let bytes = design_file(&[tcb_2d(), bad, line_2d(1, [0, 0], [5, 5])]);

    let mut strict = open_bytes(bytes.clone());
    strict.read_element().unwrap();
    assert!(strict.read_element().is_err());

    let mut lenient = open_bytes_failsafe(bytes);
    let elements = read_all(&mut lenient);
    assert_eq!(element_ids(&elements), vec![0, 2]);
    assert!(lenient.notifications().has_type(NotificationType::Error));
}

#[test]
fn test_display_dump() {
    let mut dgn = open_bytes(design_file(&[tcb_2d(), line_2d(5, [0, 0], [1000, 2000])]));
    let elements = read_all(&mut dgn);
    let text = elements[1].to_string();
    assert!(text.contains("Element:Line"));
    assert!(text.contains("Level: 5"));
    assert!(text.contains("(1000.000000,2000.000000,0.000000)"));
}

// ===========================================================================
// Floating point and linkages
// ===========================================================================

#[test]
fn test_vax_one() {
    let one = [0x80, 0x40, 0, 0, 0, 0, 0, 0];
    assert_eq!(vax_to_ieee(&one), 1.0);
    assert_eq!(ieee_to_vax(1.0), one);
    assert_eq!(vax_to_ieee(&ieee_to_vax(-1234.5)), -1234.5);
}

#[test]
fn test_dmrs_linkage_size() {
    assert_eq!(attr_link_size(&[0x00, 0x00, 0x05, 0x00, 0, 0, 0, 0], 0), 8);
    assert_eq!(attr_link_size(&[0x00, 0x00, 0x05], 0), 0);
    // generic linkage, 3 + 1 words
    assert_eq!(attr_link_size(&[0x03, 0x10, 0x41, 0x00, 0, 0, 0, 0], 0), 8);
}

#[test]
fn test_linkage_on_decoded_element() {
    let mut raw = line_2d(1, [0, 0], [1, 1]);
    // attribute data starts right after the vertices
    raw[30..32].copy_from_slice(&10u16.to_le_bytes());
    raw[32] = 0x00;
    raw[33] = 0x08;
    raw.extend_from_slice(&[0x00, 0x00, 0x05, 0x00, 0x2a, 0x00, 0x00, 0x01]);
    let words = ((raw.len() / 2 - 2) as u16).to_le_bytes();
    raw[2..4].copy_from_slice(&words);

    let mut dgn = open_bytes(design_file(&[tcb_2d(), raw]));
    let elements = read_all(&mut dgn);
    let line = &elements[1];
    assert_eq!(line.core.attr_data.len(), 8);

    let link = get_linkage(line, 0).unwrap();
    assert_eq!(link.linkage_type, linkage_type::DMRS);
    assert_eq!(link.entity_num, 5);
    assert_eq!(link.ms_link, 42);
    assert!(get_linkage(line, 1).is_none());
}

// ===========================================================================
// Index and random access
// ===========================================================================

fn sample_file() -> Vec<u8> {
    design_file(&[
        tcb_2d(),
        line_2d(1, [0, 0], [100, 50]),
        line_string_2d(2, &[[-20, 10], [30, 80], [5, 5]]),
        as_deleted(line_2d(1, [5000, 5000], [6000, 6000])),
        line_2d(3, [10, 10], [20, 20]),
    ])
}

#[test]
fn test_index_matches_sequential_read() {
    let mut dgn = open_bytes(sample_file());
    let sequential = read_all(&mut dgn);

    let index = dgn.element_index().unwrap().to_vec();
    assert_eq!(index.len(), sequential.len());
    for (entry, element) in index.iter().zip(&sequential) {
        assert_eq!(Some(entry.offset), element.core.offset);
        assert_eq!(entry.element_type, element.element_type());
        assert_eq!(entry.level, element.core.level);
        assert_eq!(entry.structure_type, element.structure_type());
        assert_eq!(entry.is_deleted(), element.core.deleted);
    }
    assert_eq!(index[0].structure_type, StructureType::Tcb);
    assert_eq!(dgn.element_count().unwrap(), 5);
}

#[test]
fn test_goto_element() {
    let mut dgn = open_bytes(sample_file());
    dgn.goto_element(4).unwrap();
    let e = dgn.read_element().unwrap().unwrap();
    assert_eq!(e.core.element_id, Some(4));
    assert_eq!(e.core.level, 3);
    assert!(dgn.read_element().unwrap().is_none());

    dgn.goto_element(2).unwrap();
    let e = dgn.read_element().unwrap().unwrap();
    assert_eq!(e.as_multi_point().unwrap().num_vertices(), 3);

    assert!(matches!(dgn.goto_element(5), Err(DgnError::InvalidArgument(_))));
}

#[test]
fn test_extents_skip_deleted_elements() {
    let mut dgn = open_bytes(sample_file());
    let ext = dgn.extents().unwrap().unwrap();
    assert_vec3_eq(&ext.min, &Vector3::new(-20.0, 0.0, 0.0), TOL);
    assert_vec3_eq(&ext.max, &Vector3::new(100.0, 80.0, 0.0), TOL);

    let mut empty = open_bytes(design_file(&[tcb_2d()]));
    assert!(empty.extents().unwrap().is_none());
}

#[test]
fn test_file_on_disk() {
    let file = temp_design_file(&[tcb_2d(), line_2d(7, [1, 2], [3, 4])]);
    let mut dgn = DgnFile::open(file.path()).unwrap();
    assert!(dgn.load_tcb().unwrap());
    let elements = read_all(&mut dgn);
    assert_eq!(elements.len(), 2);
    assert_eq!(elements[1].core.level, 7);
}

// ===========================================================================
// Spatial filter
// ===========================================================================

#[test]
fn test_spatial_filter_selects_overlapping() {
    let mut dgn = open_bytes(design_file(&[
        tcb_2d(),
        line_2d(1, [0, 0], [10, 10]),
        line_2d(1, [1000, 1000], [1010, 1010]),
        line_2d(1, [15, -100], [16, 100]),
    ]));
    dgn.set_spatial_filter(-5.0, -5.0, 20.0, 20.0);
    let elements = read_all(&mut dgn);
    // the TCB has no range and always passes
    assert_eq!(element_ids(&elements), vec![0, 1, 3]);
}

#[test]
fn test_unbounded_filter_equals_no_filter() {
    let mut plain = open_bytes(sample_file());
    let all = read_all(&mut plain);

    let mut filtered = open_bytes(sample_file());
    filtered.set_spatial_filter(-1e6, -1e6, 1e6, 1e6);
    let kept = read_all(&mut filtered);
    assert_eq!(element_ids(&all), element_ids(&kept));

    // an all-zero rectangle clears the filter
    let mut cleared = open_bytes(sample_file());
    cleared.set_spatial_filter(0.5, 0.5, 1.0, 1.0);
    cleared.set_spatial_filter(0.0, 0.0, 0.0, 0.0);
    assert_eq!(read_all(&mut cleared).len(), all.len());
}

#[test]
fn test_filter_follows_complex_header() {
    let members = vec![
        as_member(line_2d(1, [0, 0], [5, 5])),
        as_member(line_2d(1, [5, 5], [9, 9])),
    ];
    let far = complex_chain_header(1, &members, [500, 500, 0], [600, 600, 0]);
    let near = complex_chain_header(1, &members, [0, 0, 0], [9, 9, 0]);

    let mut records = vec![tcb_2d(), far];
    records.extend(members.iter().cloned());
    records.push(near);
    records.extend(members.iter().cloned());

    let mut dgn = open_bytes(design_file(&records));
    dgn.set_spatial_filter(-1.0, -1.0, 10.0, 10.0);
    let elements = read_all(&mut dgn);
    // members of the far group are dropped with their header
    assert_eq!(element_ids(&elements), vec![0, 4, 5, 6]);

    let header = elements[1].as_complex_header().unwrap();
    assert_eq!(header.numelems, 2);
    assert_eq!(header.totlength, 52);
    assert!(elements[2].core.complex);
}
