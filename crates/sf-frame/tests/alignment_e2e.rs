#![forbid(unsafe_code)]

//! End-to-end scenarios: labeled containers built from scratch, aligned,
//! combined and selected through the public API only.

use sf_array::{ArithmeticOp, Array, ComparisonOp, ILocKey};
use sf_frame::{Frame, FrameError, Series};
use sf_index::{AxisIndex, HLoc, Index, IndexHierarchy, LocKey};
use sf_types::{DType, Scalar, TimeUnit};

fn s(v: &str) -> Scalar {
    Scalar::str(v)
}

fn ix(labels: &[&str]) -> AxisIndex {
    AxisIndex::new(labels.iter().map(|l| s(l))).expect("unique labels")
}

fn series(values: &[i64], labels: &[&str]) -> Series {
    Series::new(Array::from_i64s(values.to_vec()), ix(labels)).expect("series")
}

// ---------------------------------------------------------------------------
// Scenario 1: series addition over partially overlapping indices
// ---------------------------------------------------------------------------

#[test]
fn e2e_series_addition_fills_unmatched_labels() {
    let s1 = series(&[0, 1, 2, 3], &["a", "b", "c", "d"]);
    let s2 = series(&[0, 1, 2], &["a", "b", "c"]);

    let sum = s1.add(&s2).expect("add");
    assert_eq!(sum.index().labels(), vec![s("a"), s("b"), s("c"), s("d")]);
    assert_eq!(sum.dtype(), DType::Float64);
    assert_eq!(sum.get(&s("a")), Some(Scalar::Float(0.0)));
    assert_eq!(sum.get(&s("b")), Some(Scalar::Float(2.0)));
    assert_eq!(sum.get(&s("c")), Some(Scalar::Float(4.0)));
    assert!(sum.get(&s("d")).is_some_and(|v| v.is_nan()));

    let filled = sum.fillna(&Scalar::None).expect("fillna");
    assert_eq!(filled.dtype(), DType::Object);
    assert_eq!(filled.get(&s("d")), Some(Scalar::None));
    assert_eq!(filled.get(&s("c")), Some(Scalar::Float(4.0)));
    assert!(!filled.values().is_writeable());
}

#[test]
fn e2e_comparison_on_aligned_series() {
    let left = series(&[1, 5], &["x", "y"]);
    let right = series(&[3, 3], &["y", "x"]);
    let gt = left
        .binary_op(&right, ComparisonOp::Gt.into())
        .expect("compare");
    assert_eq!(gt.dtype(), DType::Bool);
    assert_eq!(gt.get(&s("x")), Some(Scalar::Bool(false)));
    assert_eq!(gt.get(&s("y")), Some(Scalar::Bool(true)));
}

// ---------------------------------------------------------------------------
// Scenario 2: index set algebra
// ---------------------------------------------------------------------------

#[test]
fn e2e_index_union_and_intersection() {
    let left = <Index>::new([s("a"), s("b"), s("c")]).expect("left");
    let right = <Index>::new([s("b"), s("c"), s("d")]).expect("right");
    assert_eq!(
        left.union(&right).expect("union").labels(),
        vec![s("a"), s("b"), s("c"), s("d")]
    );
    assert_eq!(
        left.intersection(&right).expect("intersection").labels(),
        vec![s("b"), s("c")]
    );

    let same = <Index>::new([s("c"), s("a")]).expect("same");
    assert_eq!(
        same.union(&same.clone()).expect("identity").labels(),
        vec![s("c"), s("a")]
    );
}

// ---------------------------------------------------------------------------
// Scenario 3: hierarchical selection
// ---------------------------------------------------------------------------

#[test]
fn e2e_hierarchy_product_matches_explicit_labels() {
    let product = <IndexHierarchy>::from_product([
        vec![s("x"), s("y")],
        vec![Scalar::Int(1), Scalar::Int(2)],
    ])
    .expect("product");
    let labels = <IndexHierarchy>::from_labels([
        vec![s("x"), Scalar::Int(1)],
        vec![s("x"), Scalar::Int(2)],
        vec![s("y"), Scalar::Int(1)],
        vec![s("y"), Scalar::Int(2)],
    ])
    .expect("labels");
    let key = HLoc::tuple([s("y"), Scalar::Int(2)]);
    let from_product = product.loc_to_iloc_terminal(&key).expect("product position");
    let from_labels = labels.loc_to_iloc_terminal(&key).expect("labels position");
    assert_eq!(from_product, 3);
    assert_eq!(from_product, from_labels);
    assert!(product.equals(&labels));

    let values = Series::new(Array::from_i64s(vec![10, 20, 30, 40]), product.into()).expect("series");
    assert_eq!(
        values.hloc(&key).expect("element").into_element(),
        Some(Scalar::Int(40))
    );
}

// ---------------------------------------------------------------------------
// Scenario 4: matrix products over labels
// ---------------------------------------------------------------------------

#[test]
fn e2e_series_matmul_aligns_by_label() {
    let left = series(&[1, 2, 3], &["a", "b", "c"]);
    let right = series(&[100, 10, 1], &["c", "b", "a"]);
    // a: 1*1, b: 2*10, c: 3*100
    assert_eq!(left.matmul(&right).expect("matmul"), Scalar::Int(321));

    let short = series(&[1, 2], &["a", "b"]);
    let err = left.matmul(&short).expect_err("lengths differ");
    assert_eq!(
        err.to_string(),
        "shapes not alignable for matrix multiplication: (3,) and (2,)"
    );
}

// ---------------------------------------------------------------------------
// Scenario 5: frames built from series and combined
// ---------------------------------------------------------------------------

#[test]
fn e2e_frame_pipeline() {
    let price = series(&[10, 20, 30], &["aapl", "goog", "msft"]).with_name(s("price"));
    let volume = series(&[5, 7], &["goog", "amzn"]).with_name(s("volume"));

    let frame = Frame::from_series([&price, &volume]).expect("frame");
    assert_eq!(frame.shape(), (4, 2));
    assert_eq!(
        frame.index().labels(),
        vec![s("aapl"), s("amzn"), s("goog"), s("msft")]
    );
    assert_eq!(frame.dtypes(), vec![DType::Float64, DType::Float64]);
    assert!(frame.element(&s("amzn"), &s("price")).expect("amzn").is_nan());

    let doubled = frame
        .binary_op(&frame, ArithmeticOp::Add.into())
        .expect("self add");
    assert_eq!(
        doubled.element(&s("goog"), &s("volume")).expect("goog"),
        Scalar::Float(10.0)
    );

    let filled = frame.fillna(&Scalar::Float(0.0)).expect("fillna");
    let row = filled
        .loc(&LocKey::from("msft"), &LocKey::Labels(vec![s("price"), s("volume")]))
        .expect("row")
        .into_series()
        .expect("series");
    assert_eq!(row.name(), Some(&s("msft")));
    assert_eq!(row.values().to_vec(), vec![Scalar::Float(30.0), Scalar::Float(0.0)]);

    let weights = series(&[1, 2], &["volume", "price"]);
    let weighted = filled.matmul_series(&weights).expect("weighted");
    assert_eq!(weighted.get(&s("goog")), Some(Scalar::Float(47.0)));

    let narrow = filled
        .iloc(&ILocKey::Slice(sf_array::Slice::range(0, 2)), &ILocKey::all())
        .expect("slice")
        .into_frame()
        .expect("frame");
    assert_eq!(narrow.shape(), (2, 2));
}

#[test]
fn e2e_unhashable_names_and_length_errors() {
    let unnamed = series(&[1], &["a"]);
    let frame = Frame::from_series([&unnamed]).expect("positional label");
    assert_eq!(frame.columns().labels(), vec![Scalar::Int(0)]);

    let nan_named = unnamed.clone().with_name(Scalar::Float(f64::NAN));
    assert!(matches!(
        Frame::from_series([&nan_named]),
        Err(FrameError::NameUnhashable { .. })
    ));
    assert!(matches!(
        Series::new(Array::from_i64s(vec![1, 2]), ix(&["a"])),
        Err(FrameError::LengthMismatch { index_len: 1, values_len: 2 })
    ));
}

// ---------------------------------------------------------------------------
// Scenario 6: temporal values keep their dtype under reindexing
// ---------------------------------------------------------------------------

#[test]
fn e2e_temporal_reindex_fills_nat() {
    let unit = TimeUnit::Day;
    let values = Array::from_scalars(
        &[Scalar::DateTime(0, unit), Scalar::DateTime(1, unit)],
        DType::DateTime64(unit),
    )
    .expect("dates");
    let dates = Series::new(values, ix(&["a", "b"])).expect("series");
    let wider = dates.reindex(ix(&["a", "b", "c"]), None).expect("reindex");
    assert_eq!(wider.dtype(), DType::DateTime64(unit));
    assert!(wider.get(&s("c")).is_some_and(|v| v.is_na()));
    assert_eq!(wider.isna().values().to_vec(), vec![
        Scalar::Bool(false),
        Scalar::Bool(false),
        Scalar::Bool(true),
    ]);
}
