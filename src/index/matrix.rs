//! Dense embedding matrix, cosine scoring, and its binary codec.
//!
//! Blob layout (little-endian):
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | magic `CNXM` |
//! | 4 | 4 | format version (`u32`) |
//! | 8 | 8 | rows (`u64`) |
//! | 16 | 8 | dim (`u64`) |
//! | 24 | rows × dim × 4 | `f32` values, row-major |

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::Serialize;

use crate::error::IndexError;

const MAGIC: &[u8; 4] = b"CNXM";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 24;

/// A semantic candidate: catalog row and its cosine similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SemanticHit {
    pub row: usize,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Array2<f32>,
    /// L2 norm of each row, precomputed for cosine scoring.
    norms: Array1<f32>,
}

impl EmbeddingMatrix {
    pub fn from_array(data: Array2<f32>) -> Self {
        let norms = data.map_axis(Axis(1), |row| row.dot(&row).sqrt());
        Self { data, norms }
    }

    /// Build from row vectors, each exactly `dim` wide.
    pub fn from_rows(rows: Vec<Vec<f32>>, dim: usize) -> Result<Self, IndexError> {
        let n = rows.len();
        let mut flat = Vec::with_capacity(n * dim);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != dim {
                return Err(IndexError::Hydration(format!(
                    "row {i} has {} values, expected {dim}",
                    row.len()
                )));
            }
            flat.extend(row);
        }
        let data = Array2::from_shape_vec((n, dim), flat)
            .map_err(|e| IndexError::Hydration(e.to_string()))?;
        Ok(Self::from_array(data))
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f32> {
        self.data.row(i)
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.data
    }

    /// Cosine similarity of `query` against every row. Rows (or a query) with
    /// zero norm score 0.
    pub fn cosine_scores(&self, query: &[f32]) -> Result<Vec<f32>, IndexError> {
        if query.len() != self.dim() {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim(),
                actual: query.len(),
            });
        }
        let q = ArrayView1::from(query);
        let q_norm = q.dot(&q).sqrt();
        let dots = self.data.dot(&q);
        Ok(dots
            .iter()
            .zip(self.norms.iter())
            .map(|(&dot, &norm)| {
                let denom = norm * q_norm;
                if denom > 0.0 {
                    dot / denom
                } else {
                    0.0
                }
            })
            .collect())
    }

    /// The `k` most similar rows, descending by score, ties by ascending row.
    pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<SemanticHit>, IndexError> {
        let mut hits: Vec<SemanticHit> = self
            .cosine_scores(query)?
            .into_iter()
            .enumerate()
            .map(|(row, score)| SemanticHit { row, score })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.row.cmp(&b.row)));
        hits.truncate(k);
        Ok(hits)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.rows() as u64).to_le_bytes());
        out.extend_from_slice(&(self.dim() as u64).to_le_bytes());
        // Logical (row-major) order regardless of memory layout.
        for v in self.data.iter() {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, IndexError> {
        let corrupt = |msg: String| IndexError::CorruptMatrix(msg);

        if bytes.len() < HEADER_LEN {
            return Err(corrupt(format!("{} bytes is shorter than the header", bytes.len())));
        }
        if &bytes[0..4] != MAGIC {
            return Err(corrupt("bad magic".into()));
        }
        let version = u32::from_le_bytes(read_array(&bytes[4..8]));
        if version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {version}")));
        }
        let rows = u64::from_le_bytes(read_array(&bytes[8..16])) as usize;
        let dim = u64::from_le_bytes(read_array(&bytes[16..24])) as usize;

        let expected = rows
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(4))
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| corrupt(format!("shape {rows}x{dim} overflows")))?;
        if bytes.len() != expected {
            return Err(corrupt(format!(
                "expected {expected} bytes for {rows}x{dim}, found {}",
                bytes.len()
            )));
        }

        let values: Vec<f32> = bytes[HEADER_LEN..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(read_array(c)))
            .collect();
        let data = Array2::from_shape_vec((rows, dim), values)
            .map_err(|e| corrupt(e.to_string()))?;
        Ok(Self::from_array(data))
    }
}

fn read_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    buf.copy_from_slice(&slice[..N]);
    buf
}
