// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph records and their JSON input form.
//!
//! The record producer emits a top-level JSON array of flat objects. Scalar
//! fields deserialize directly; array fields arrive as nested JSON lists and are
//! converted to [`NdArray`]s according to an [`ArrayLayout`].

use serde::Deserialize;
use serde_json::Value as Json;
use spectra_codec::{Element, NdArray, Value};
use spectra_config::ArrayLayout;

use crate::error::StoreError;
use crate::schema::Record;

/// Precomputed invariants of one graph; one table row.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRecord {
    /// Vertex count.
    pub num_vertices: u8,
    /// Canonical graph6 encoding.
    pub graph6: String,
    /// Bandwidth of the {0,1,-1} eigenbasis.
    pub band_01neg: u8,
    /// Bandwidth of the {1,-1} eigenbasis.
    pub band_1neg: f64,
    /// Laplacian eigenvalues.
    pub eigvals: NdArray,
    /// {0,1,-1} eigenbasis, one eigenvector per column.
    pub eigbasis_01neg: NdArray,
    /// {1,-1} eigenbasis, one eigenvector per column.
    pub eigbasis_1neg: NdArray,
    /// Edge count.
    pub num_edges: u16,
    /// Edge density.
    pub density: f64,
    /// Mean vertex degree.
    pub avg_degree: f64,
    /// Whether the graph is connected.
    pub is_connected: bool,
    /// Whether every vertex has the same degree.
    pub is_regular: bool,
    /// Whether the graph is two-colourable.
    pub is_bipartite: bool,
    /// Whether the graph is P4-free.
    pub is_cograph: bool,
    /// Prime factors of the graph.
    pub prime_factors: NdArray,
    /// Prime factors of the complement.
    pub compl_prime_factors: NdArray,
}

impl Record for GraphRecord {
    fn field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "num_vertices" => Value::Integer(i64::from(self.num_vertices)),
            "graph6" => Value::Text(self.graph6.clone()),
            "band_01neg" => Value::Integer(i64::from(self.band_01neg)),
            "band_1neg" => Value::Real(self.band_1neg),
            "eigvals" => Value::Array(self.eigvals.clone()),
            "eigbasis_01neg" => Value::Array(self.eigbasis_01neg.clone()),
            "eigbasis_1neg" => Value::Array(self.eigbasis_1neg.clone()),
            "num_edges" => Value::Integer(i64::from(self.num_edges)),
            "density" => Value::Real(self.density),
            "avg_degree" => Value::Real(self.avg_degree),
            "is_connected" => Value::Boolean(self.is_connected),
            "is_regular" => Value::Boolean(self.is_regular),
            "is_bipartite" => Value::Boolean(self.is_bipartite),
            "is_cograph" => Value::Boolean(self.is_cograph),
            "prime_factors" => Value::Array(self.prime_factors.clone()),
            "compl_prime_factors" => Value::Array(self.compl_prime_factors.clone()),
            _ => return None,
        };
        Some(value)
    }
}

/// Wire shape of one record; array fields stay as raw JSON until converted.
#[derive(Debug, Deserialize)]
struct RawGraphRecord {
    num_vertices: u8,
    graph6: String,
    band_01neg: u8,
    band_1neg: f64,
    eigvals: Json,
    eigbasis_01neg: Json,
    eigbasis_1neg: Json,
    num_edges: u16,
    density: f64,
    avg_degree: f64,
    is_connected: bool,
    is_regular: bool,
    is_bipartite: bool,
    is_cograph: bool,
    prime_factors: Json,
    compl_prime_factors: Json,
}

impl RawGraphRecord {
    fn convert(self, layout: ArrayLayout) -> Result<GraphRecord, String> {
        Ok(GraphRecord {
            eigvals: float_array("eigvals", &self.eigvals, layout)?,
            eigbasis_01neg: float_array("eigbasis_01neg", &self.eigbasis_01neg, layout)?,
            eigbasis_1neg: float_array("eigbasis_1neg", &self.eigbasis_1neg, layout)?,
            prime_factors: int_array("prime_factors", &self.prime_factors, layout)?,
            compl_prime_factors: int_array(
                "compl_prime_factors",
                &self.compl_prime_factors,
                layout,
            )?,
            num_vertices: self.num_vertices,
            graph6: self.graph6,
            band_01neg: self.band_01neg,
            band_1neg: self.band_1neg,
            num_edges: self.num_edges,
            density: self.density,
            avg_degree: self.avg_degree,
            is_connected: self.is_connected,
            is_regular: self.is_regular,
            is_bipartite: self.is_bipartite,
            is_cograph: self.is_cograph,
        })
    }
}

/// Parses a JSON array of graph records.
///
/// Extra keys are ignored. A missing key, a wrongly typed scalar, or a ragged
/// or non-numeric array fails with [`StoreError::InvalidRecord`] naming the
/// record's index.
pub fn parse_records(json: &[u8], layout: ArrayLayout) -> Result<Vec<GraphRecord>, StoreError> {
    let items: Vec<Json> = serde_json::from_slice(json)?;
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<RawGraphRecord>(item)
                .map_err(|e| e.to_string())
                .and_then(|raw| raw.convert(layout))
                .map_err(|reason| StoreError::InvalidRecord { index, reason })
        })
        .collect()
}

fn float_array(field: &str, json: &Json, layout: ArrayLayout) -> Result<NdArray, String> {
    nested_array(json, layout, Json::as_f64).map_err(|e| format!("{field}: {e}"))
}

fn int_array(field: &str, json: &Json, layout: ArrayLayout) -> Result<NdArray, String> {
    nested_array(json, layout, Json::as_i64).map_err(|e| format!("{field}: {e}"))
}

/// Converts a rectangular nested list into an array.
///
/// The shape is read off the first element at each depth; every other list
/// must agree. With [`ArrayLayout::ColMajor`] the outermost list indexes the
/// last axis, so the parsed array is transposed.
fn nested_array<T, F>(json: &Json, layout: ArrayLayout, leaf: F) -> Result<NdArray, String>
where
    T: Element,
    F: Fn(&Json) -> Option<T>,
{
    let mut shape = Vec::new();
    let mut probe = json;
    while let Json::Array(items) = probe {
        shape.push(items.len());
        match items.first() {
            Some(first) => probe = first,
            None => break,
        }
    }
    let mut values = Vec::new();
    flatten(json, &shape, &leaf, &mut values)?;
    let array = NdArray::from_vec(shape, values).map_err(|e| e.to_string())?;
    Ok(match layout {
        ArrayLayout::ColMajor if array.ndim() > 1 => array.transpose(),
        _ => array,
    })
}

fn flatten<T, F>(json: &Json, shape: &[usize], leaf: &F, out: &mut Vec<T>) -> Result<(), String>
where
    F: Fn(&Json) -> Option<T>,
{
    match (shape.split_first(), json) {
        (None, Json::Array(_)) => Err("ragged nesting: list where a number was expected".into()),
        (None, scalar) => {
            let value = leaf(scalar).ok_or_else(|| format!("unsupported element {scalar}"))?;
            out.push(value);
            Ok(())
        }
        (Some((&len, rest)), Json::Array(items)) => {
            if items.len() != len {
                return Err(format!(
                    "ragged nesting: expected {len} items, found {}",
                    items.len()
                ));
            }
            items.iter().try_for_each(|item| flatten(item, rest, leaf, out))
        }
        (Some(_), other) => Err(format!("ragged nesting: expected a list, found {other}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    fn sample(n: u8) -> Json {
        json!({
            "num_vertices": n,
            "graph6": "Bw",
            "band_01neg": 1,
            "band_1neg": 2.0,
            "eigvals": [0.0, 1.0, 3.0],
            "eigbasis_01neg": [[1, 1, 1], [1, 0, -1], [1, -2, 1]],
            "eigbasis_1neg": [[1.0, 1.0, 1.0]],
            "num_edges": 2,
            "density": 0.6666666666666666,
            "avg_degree": 1.3333333333333333,
            "is_connected": true,
            "is_regular": false,
            "is_bipartite": true,
            "is_cograph": true,
            "prime_factors": [2, 3],
            "compl_prime_factors": [],
            "producer_version": "ignored"
        })
    }

    fn parse(value: &Json) -> Result<Vec<GraphRecord>, StoreError> {
        parse_records(&serde_json::to_vec(value).unwrap(), ArrayLayout::ColMajor)
    }

    #[test]
    fn parses_scalars_and_ignores_extra_keys() {
        let records = parse(&json!([sample(3), sample(4)])).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].num_vertices, 3);
        assert_eq!(records[1].num_vertices, 4);
        assert_eq!(records[0].graph6, "Bw");
        assert!(records[0].is_bipartite);
        assert_eq!(records[0].eigvals.to_vec::<f64>().unwrap(), vec![0.0, 1.0, 3.0]);
        assert_eq!(records[0].prime_factors.to_vec::<i64>().unwrap(), vec![2, 3]);
        assert_eq!(records[0].compl_prime_factors.shape(), &[0]);
    }

    #[test]
    fn column_major_lists_become_columns() {
        let records = parse(&json!([sample(3)])).unwrap();
        let basis = &records[0].eigbasis_1neg;
        // One eigenvector of length 3, stored as a single column.
        assert_eq!(basis.shape(), &[3, 1]);
        let basis = &records[0].eigbasis_01neg;
        assert_eq!(basis.shape(), &[3, 3]);
        assert_eq!(
            basis.to_vec::<f64>().unwrap(),
            vec![1.0, 1.0, 1.0, 1.0, 0.0, -2.0, 1.0, -1.0, 1.0]
        );
    }

    #[test]
    fn row_major_lists_become_rows() {
        let bytes = serde_json::to_vec(&json!([sample(3)])).unwrap();
        let records = parse_records(&bytes, ArrayLayout::RowMajor).unwrap();
        let basis = &records[0].eigbasis_01neg;
        assert_eq!(
            basis.to_vec::<f64>().unwrap(),
            vec![1.0, 1.0, 1.0, 1.0, 0.0, -1.0, 1.0, -2.0, 1.0]
        );
        assert_eq!(records[0].eigbasis_1neg.shape(), &[1, 3]);
    }

    #[test]
    fn field_lookup_covers_every_catalog_column() {
        let record = parse(&json!([sample(5)])).unwrap().remove(0);
        for name in crate::schema::SchemaCatalog::graph_records().names() {
            assert!(record.field(name).is_some(), "{name}");
        }
        assert_eq!(record.field("num_vertices"), Some(Value::Integer(5)));
        assert_eq!(record.field("is_regular"), Some(Value::Boolean(false)));
        assert_eq!(record.field("nope"), None);
    }

    #[test]
    fn missing_key_names_the_record_index() {
        let mut broken = sample(4);
        broken.as_object_mut().unwrap().remove("density");
        let err = parse(&json!([sample(3), broken])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRecord);
        assert!(matches!(err, StoreError::InvalidRecord { index: 1, .. }));
        assert!(err.to_string().contains("density"));
    }

    #[test]
    fn ragged_and_non_numeric_arrays_are_rejected() {
        let mut ragged = sample(3);
        ragged["eigbasis_01neg"] = json!([[1, 2], [3]]);
        let err = parse(&json!([ragged])).unwrap_err();
        assert!(err.to_string().contains("eigbasis_01neg"));

        let mut textual = sample(3);
        textual["prime_factors"] = json!(["two"]);
        let err = parse(&json!([textual])).unwrap_err();
        assert!(err.to_string().contains("prime_factors"));

        let mut fractional = sample(3);
        fractional["prime_factors"] = json!([2.5]);
        assert!(parse(&json!([fractional])).is_err());
    }

    #[test]
    fn top_level_must_be_an_array() {
        let err = parse(&json!({"records": []})).unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidRecord);
        assert!(parse(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_scalars_are_rejected() {
        let mut big = sample(3);
        big["num_vertices"] = json!(300);
        assert!(matches!(
            parse(&json!([big])).unwrap_err(),
            StoreError::InvalidRecord { index: 0, .. }
        ));
    }
}
