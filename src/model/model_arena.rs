//! Upper index plus the serialized array of submodels (component C5).
//!
//! Owns the sorted pivot array (`model_keys`) that routes a key to a
//! submodel, and the submodels themselves. [`ModelArena::serialize`] lays
//! these out exactly per spec §4.5: a fixed-size reserved prefix holding
//! `num_models` and the two parallel pivot/offset arrays, followed by the
//! packed submodel bodies — so that engines trained on one host and loaded
//! on another produce byte-identical arenas for the same training input.

use crate::error::{Result, RolexError};
use crate::model::submodel::SubModel;

/// Sorted pivot keys plus the submodels they route to.
pub struct ModelArena<const N: usize> {
    model_keys: Vec<u64>,
    submodels: Vec<SubModel<N>>,
    upper_reserved: usize,
    syn_max: usize,
}

impl<const N: usize> ModelArena<N> {
    pub fn new(upper_reserved: usize, syn_max: usize) -> Self {
        Self {
            model_keys: Vec::new(),
            submodels: Vec::new(),
            upper_reserved,
            syn_max,
        }
    }

    /// Appends a submodel under pivot `max_key` (the largest training key
    /// routed to it). Submodels must be pushed in ascending pivot order,
    /// matching the order the PLR builder closes its segments in.
    pub fn push(&mut self, max_key: u64, submodel: SubModel<N>) {
        debug_assert!(
            self.model_keys.last().map_or(true, |&last| max_key > last),
            "submodels must be pushed in strictly increasing pivot order"
        );
        self.model_keys.push(max_key);
        self.submodels.push(submodel);
    }

    pub fn len(&self) -> usize {
        self.submodels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submodels.is_empty()
    }

    pub fn get(&self, i: usize) -> &SubModel<N> {
        &self.submodels[i]
    }

    /// The upper-index pivot (largest training key) routed to submodel `i`.
    pub fn pivot_key(&self, i: usize) -> u64 {
        self.model_keys[i]
    }

    /// Maximum number of submodels this arena's reserved prefix can address:
    /// each submodel consumes one `u64` pivot entry and one `u64` offset
    /// entry, stored in the two halves of the reservation.
    pub fn max_submodels(&self) -> usize {
        (self.upper_reserved / 2) / std::mem::size_of::<u64>()
    }

    /// Routes `k` to a submodel index: the first `i` with `model_keys[i] >=
    /// k`, clamped to the last submodel. Branchless binary search per spec
    /// §4.6.
    pub fn model_for_key(&self, k: u64) -> usize {
        let idx = self.model_keys.partition_point(|&mk| mk < k);
        idx.min(self.model_keys.len().saturating_sub(1))
    }

    /// Lays out the reserved prefix (`num_models`, pivot array, offset
    /// array) followed by each submodel's `body_len | body`, per spec §4.5.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let num_models = self.submodels.len();
        if num_models > self.max_submodels() {
            return Err(RolexError::Decode(format!(
                "{num_models} submodels exceed upper index capacity of {}; \
                 increase RolexConfig::upper_reserved or epsilon",
                self.max_submodels()
            )));
        }

        let mut bodies = Vec::new();
        let mut offsets = Vec::with_capacity(num_models);
        for sm in &self.submodels {
            let body = sm.serialize();
            offsets.push((self.upper_reserved + bodies.len()) as u64);
            bodies.extend_from_slice(&(body.len() as u32).to_le_bytes());
            bodies.extend_from_slice(&body);
        }

        let mut out = vec![0u8; self.upper_reserved];
        out[0..8].copy_from_slice(&(num_models as u64).to_le_bytes());

        let mut cursor = 8;
        for key in &self.model_keys {
            out[cursor..cursor + 8].copy_from_slice(&key.to_le_bytes());
            cursor += 8;
        }

        let half = self.upper_reserved / 2;
        let mut cursor = half;
        for offset in &offsets {
            out[cursor..cursor + 8].copy_from_slice(&offset.to_le_bytes());
            cursor += 8;
        }

        out.extend_from_slice(&bodies);
        Ok(out)
    }

    /// Inverse of [`ModelArena::serialize`].
    pub fn deserialize(bytes: &[u8], upper_reserved: usize, syn_max: usize) -> Result<Self> {
        if bytes.len() < upper_reserved {
            return Err(RolexError::Decode("model arena prefix truncated".into()));
        }
        let num_models = u64::from_le_bytes(bytes[0..8].try_into().unwrap()) as usize;

        let mut model_keys = Vec::with_capacity(num_models);
        let mut cursor = 8;
        for _ in 0..num_models {
            let key = u64::from_le_bytes(bytes[cursor..cursor + 8].try_into().unwrap());
            model_keys.push(key);
            cursor += 8;
        }

        let half = upper_reserved / 2;
        let mut offsets = Vec::with_capacity(num_models);
        let mut cursor = half;
        for _ in 0..num_models {
            let offset = u64::from_le_bytes(bytes[cursor..cursor + 8].try_into().unwrap());
            offsets.push(offset as usize);
            cursor += 8;
        }

        let mut submodels = Vec::with_capacity(num_models);
        for offset in offsets {
            if bytes.len() < offset + 4 {
                return Err(RolexError::Decode("submodel length truncated".into()));
            }
            let body_len =
                u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
            let body_start = offset + 4;
            if bytes.len() < body_start + body_len {
                return Err(RolexError::Decode("submodel body truncated".into()));
            }
            let sm = SubModel::deserialize(&bytes[body_start..body_start + body_len], syn_max)?;
            submodels.push(sm);
        }

        Ok(Self {
            model_keys,
            submodels,
            upper_reserved,
            syn_max,
        })
    }
}
