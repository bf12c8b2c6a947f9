//! Model Tests
//!
//! Parsing, dumping and editing of whole v.in files.

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use test_case::test_case;

use vin_core::model::{Model, NodeIndex};
use vin_core::VinError;

const THREE_LAYERS: &str = include_str!("data/three_layers.vin");

fn model() -> Model {
    Model::loads(THREE_LAYERS).unwrap()
}

// === Format Tests ===

#[test]
fn test_shrunk_dump_reproduces_file() {
    assert_eq!(model().dumps_with(true), THREE_LAYERS);
}

#[test]
fn test_plain_dump_keeps_fixed_nodes() {
    let text = model().dumps();
    assert!(text.starts_with(concat!(
        " 1    0.000  12.000\n",
        " 0    0.000   0.000\n",
        "          0       0\n",
    )));
    assert_eq!(Model::loads(&text).unwrap(), model());
    assert_eq!(Model::loads(&text).unwrap().dumps_with(true), THREE_LAYERS);
}

#[test]
fn test_long_line_folds_into_chunks() {
    let model = model();
    let depth = model.get_layer(1).unwrap().depth();
    assert_eq!(depth.len(), 13);
    assert_eq!(depth.x()[12], 12.0);
    assert_eq!(depth.vary()[11], 1);

    let layer_text = model.get_layer(1).unwrap().dumps(2, true);
    let rows: Vec<&str> = layer_text.lines().collect();
    assert_eq!(rows.len(), 12);
    assert!(rows[1].starts_with(" 1 "));
    assert!(rows[4].starts_with(" 0 "));
}

#[test]
fn test_extent() {
    let model = model();
    assert_eq!(model.nlayer(), 3);
    assert_eq!(model.xlim(), Some((0.0, 12.0)));
    assert_eq!(model.ylim(), Some((0.0, 5.5)));
}

#[test]
fn test_malformed_files() {
    let missing_terminal = THREE_LAYERS.trim_end().rsplit_once('\n').unwrap().0;
    assert!(Model::loads(missing_terminal).unwrap_err().is_format_error());

    let bad_number = THREE_LAYERS.replacen("1.510", "1.5x0", 1);
    let err = Model::loads(&bad_number).unwrap_err();
    assert!(matches!(err, VinError::Parse { line: 8, .. }));

    assert!(Model::loads("").is_err());
}

#[test]
fn test_equality_ignores_stamps() {
    let restamped = THREE_LAYERS.replace("\n 3 ", "\n 9 ").replace("\n 4 ", "\n 7 ");
    let other = Model::loads(&restamped).unwrap();
    assert_eq!(other.nlayer(), 3);
    assert_eq!(other, model());
}

#[test]
fn test_load_and_dump_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("v.in");
    std::fs::write(&path, THREE_LAYERS).unwrap();

    let mut model = Model::load(&path).unwrap();
    model.delete_layer(1).unwrap();
    let out = dir.path().join("v2.in");
    model.dump_with(&out, true).unwrap();

    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.ends_with(" 3   12.000\n 0    8.000\n"));
    assert_eq!(Model::load(&out).unwrap(), model);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = Model::load(&dir.path().join("absent.in")).unwrap_err();
    assert_eq!(err.error_code(), "FILE_NOT_FOUND");
}

#[test]
fn test_unreadable_file() {
    let dir = TempDir::new().unwrap();
    let err = Model::load(dir.path()).unwrap_err();
    assert!(matches!(err, VinError::FileReadError { .. }));
    assert_eq!(err.error_code(), "FILE_READ_ERROR");
}

const WIDE_PROFILE: &str = " 1 -200.000 150.000
 0    0.000   0.000
          0       0
 1 -200.000-120.000 150.000
 0    1.500   1.600   1.700
          0       1       0
 1 -200.000 150.000
 0    1.800   1.900
          0       0
 2 -200.000 150.000
 0    3.000   3.500
          0       0
 2 -200.000 150.000
 0    3.100   3.200
          0       0
 2 -200.000 150.000
 0    4.000   4.500
          1       1
 3  150.000
 0    6.000
";

#[test]
fn test_negative_offsets_survive_file_cycle() {
    let model = Model::loads(WIDE_PROFILE).unwrap();
    assert_eq!(model.nlayer(), 2);
    assert_eq!(model.xlim(), Some((-200.0, 150.0)));
    assert_eq!(
        model.get_layer(0).unwrap().v_top().x(),
        &[-200.0, -120.0, 150.0]
    );
    assert_eq!(model.dumps(), WIDE_PROFILE);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("v.in");
    model.dump(&path).unwrap();
    assert_eq!(Model::load(&path).unwrap(), model);
}

// === Anchor Rules ===

#[test_case(0, 0, 0 ; "leading depth node")]
#[test_case(1, 0, 12 ; "ending depth node")]
#[test_case(1, 1, 1 ; "ending top velocity node")]
#[test_case(2, 2, 0 ; "leading bottom velocity node")]
fn test_anchor_cannot_move_horizontally(ilayer: usize, ipart: usize, inode: usize) {
    let mut model = model();
    let idx = NodeIndex::new(ilayer, ipart, inode);
    let err = model.move_node(idx, 0.5, 0.0).unwrap_err();
    assert!(matches!(err, VinError::Invariant { .. }));
    assert_eq!(model, self::model());

    // vertical moves stay legal
    assert!(model.move_node(idx, 0.0, 0.1).is_ok());
}

#[test_case(0, 0, 0 ; "leading node")]
#[test_case(1, 0, 12 ; "ending node")]
#[test_case(2, 1, 1 ; "ending velocity node")]
fn test_anchor_cannot_be_deleted(ilayer: usize, ipart: usize, inode: usize) {
    let mut model = model();
    let err = model
        .delete_node(NodeIndex::new(ilayer, ipart, inode))
        .unwrap_err();
    assert!(err.is_rejected_edit());
    assert_eq!(model, self::model());
}

#[test_case(0, 0, 1 ; "after last depth node")]
#[test_case(1, 2, 1 ; "after last velocity node")]
fn test_cannot_insert_after_ending(ilayer: usize, ipart: usize, inode: usize) {
    let mut model = model();
    let err = model
        .insert_node(NodeIndex::new(ilayer, ipart, inode), None)
        .unwrap_err();
    assert!(err.to_string().contains("ENDING"));
}

#[test]
fn test_insert_after_leading_is_legal() {
    let mut model = model();
    let node = model.insert_node(NodeIndex::new(0, 0, 0), None).unwrap();
    assert_eq!(node.x, 6.0);
    assert_eq!(model.get_layer(0).unwrap().depth().len(), 3);
}

#[test]
fn test_exhaustive_depth_deletion_stops_at_anchors() {
    let mut model = model();
    let idx = NodeIndex::new(1, 0, 1);
    for _ in 0..11 {
        assert!(!model.delete_node(idx).unwrap());
    }
    let depth = model.get_layer(1).unwrap().depth();
    assert_eq!(depth.x(), &[0.0, 12.0]);
    // node 1 is now the ending anchor
    assert!(model.delete_node(idx).is_err());
    assert_eq!(model.nlayer(), 3);
}

#[test]
fn test_traversal_covers_every_depth_node() {
    let model = model();
    let mut idx = NodeIndex::default();
    let mut count = 1;
    while let Some(next) = idx.next(&model) {
        assert!(next > idx);
        idx = next;
        count += 1;
    }
    assert_eq!(count, 2 + 13 + 2);
    assert!(idx.is_end(&model));
}
