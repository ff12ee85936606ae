//! Top-level orchestrator: training, dispatch, and the public KV surface
//! (component C6).
//!
//! Readers (`search`/`scan`) take no locks of their own — they call straight
//! into the immutable upper index and then into the leaf table, which
//! serializes only the mutation path per slot (see
//! [`crate::model::leaf_table`]). Submodels and the upper index are never
//! mutated after [`RolexEngine::train`] returns, so no synchronization is
//! needed between readers and writers over model geometry; only the leaf
//! contents themselves move, under their slot's lock.

use crate::config::RolexConfig;
use crate::error::{Result, RolexError};
use crate::model::model_arena::ModelArena;
use crate::model::plr::PlrBuilder;
use crate::model::submodel::{LinearModel, SubModel};
use crate::model::{LeafArena, LeafTable};

/// The learned index: a leaf arena shared by every submodel's leaf table,
/// plus the upper index routing keys to submodels.
pub struct RolexEngine<const N: usize> {
    arena: LeafArena<N>,
    models: ModelArena<N>,
    config: RolexConfig,
}

impl<const N: usize> RolexEngine<N> {
    /// Trains a fresh engine over a sorted, deduplicated key stream.
    ///
    /// # Panics
    ///
    /// Panics if `keys.len() != vals.len()` or if `keys` is not strictly
    /// increasing — both are `TrainingInvariant` violations per spec §7,
    /// i.e. caller bugs rather than recoverable runtime conditions.
    pub fn train(keys: &[u64], vals: &[u64], config: RolexConfig) -> Self {
        assert_eq!(
            keys.len(),
            vals.len(),
            "training invariant violated: keys and vals must have equal length"
        );
        assert!(
            keys.windows(2).all(|w| w[0] < w[1]),
            "training invariant violated: keys must be strictly increasing with no duplicates"
        );

        let arena = LeafArena::<N>::new(config.leaf_capacity);
        let segments = plr_segments(keys, config.epsilon);

        let mut models = ModelArena::<N>::new(config.upper_reserved, config.syn_max);
        for (seg_slope, seg_intercept, start, end) in segments {
            let capacity = end - start;
            let mut table = LeafTable::new(config.syn_max);
            let mut leaf_num = arena
                .fetch_new_leaf()
                .expect("leaf arena undersized for training set; increase RolexConfig::leaf_capacity");
            table.train_push(leaf_num);
            for i in start..end {
                if arena.get(leaf_num).read().is_full() {
                    leaf_num = arena.fetch_new_leaf().expect(
                        "leaf arena undersized for training set; increase RolexConfig::leaf_capacity",
                    );
                    table.train_push(leaf_num);
                }
                arena.get(leaf_num).write().insert_not_full(keys[i], vals[i]);
            }

            // The PLR segment was fit against the *global* rank of each key;
            // rebase its intercept so predictions land in [0, capacity) local
            // to this submodel, matching the design's per-submodel windows.
            let local_intercept = seg_intercept - start as f64;
            let model = LinearModel {
                slope: seg_slope,
                intercept: local_intercept,
            };
            let submodel = SubModel::new(model, capacity, table);
            models.push(keys[end - 1], submodel);
        }

        tracing::info!(
            keys = keys.len(),
            submodels = models.len(),
            leaves = arena.used(),
            epsilon = config.epsilon,
            "trained rolex engine"
        );

        Self {
            arena,
            models,
            config,
        }
    }

    /// Point lookup.
    pub fn search(&self, k: u64) -> Option<u64> {
        let sm = self.submodel_for(k)?;
        sm.search(k, self.config.epsilon, &self.arena)
    }

    /// Overwrites the value of an existing key. Returns `false` if absent.
    pub fn update(&self, k: u64, v: u64) -> bool {
        match self.submodel_for(k) {
            Some(sm) => sm.update(k, v, self.config.epsilon, &self.arena),
            None => false,
        }
    }

    /// Inserts a new key. Fails with [`RolexError::Duplicate`] if already
    /// present, or [`RolexError::SynonymExhausted`] /
    /// [`RolexError::Capacity`] when a split is required but the synonym
    /// table or leaf arena has no room left — both signal a retraining need
    /// to the caller.
    pub fn insert(&self, k: u64, v: u64) -> Result<()> {
        let sm = self
            .submodel_for(k)
            .ok_or(RolexError::Capacity)?;
        if sm.insert(k, v, self.config.epsilon, &self.arena)? {
            Ok(())
        } else {
            Err(RolexError::Duplicate { key: k })
        }
    }

    /// Removes a key. Returns `false` if absent.
    pub fn remove(&self, k: u64) -> bool {
        match self.submodel_for(k) {
            Some(sm) => sm.remove(k, self.config.epsilon, &self.arena),
            None => false,
        }
    }

    /// Forward range scan: up to `n` values for keys `>= k`, in key order.
    /// Not snapshot-consistent under concurrent inserts per spec §5.
    pub fn scan(&self, k: u64, n: usize) -> Vec<u64> {
        let mut pairs = Vec::new();
        if n == 0 || self.models.is_empty() {
            return pairs;
        }
        let mut idx = self.models.model_for_key(k);
        let sm = self.models.get(idx);
        pairs.extend(sm.range(k, n, self.config.epsilon, &self.arena));

        idx += 1;
        while pairs.len() < n && idx < self.models.len() {
            let sm = self.models.get(idx);
            let remaining = n - pairs.len();
            pairs.extend(sm.range_from_start(remaining, &self.arena));
            idx += 1;
        }

        pairs.truncate(n);
        pairs.into_iter().map(|(_, v)| v).collect()
    }

    fn submodel_for(&self, k: u64) -> Option<&SubModel<N>> {
        if self.models.is_empty() {
            return None;
        }
        Some(self.models.get(self.models.model_for_key(k)))
    }

    /// Read-only access to the tuning knobs this engine was built with.
    pub fn config(&self) -> &RolexConfig {
        &self.config
    }

    /// Number of submodels (for admin/stats reporting).
    pub fn submodel_count(&self) -> usize {
        self.models.len()
    }

    /// Leaf arena occupancy (for admin/stats reporting).
    pub fn leaves_used(&self) -> u64 {
        self.arena.used()
    }

    pub fn leaf_capacity(&self) -> u64 {
        self.arena.capacity()
    }

    pub(crate) fn arena(&self) -> &LeafArena<N> {
        &self.arena
    }

    pub(crate) fn models(&self) -> &ModelArena<N> {
        &self.models
    }

    /// Serializes the whole engine: a small config header, then the leaf
    /// arena, then the model arena (per spec §4.5). The config header
    /// carries the runtime knobs (`epsilon`, `syn_max`, `upper_reserved`,
    /// `leaf_capacity`) needed to interpret the rest of the buffer; `N` is a
    /// compile-time parameter, so the caller must deserialize into the same
    /// `RolexEngine<N>`.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.config.epsilon as u64).to_le_bytes());
        out.extend_from_slice(&(self.config.syn_max as u64).to_le_bytes());
        out.extend_from_slice(&(self.config.upper_reserved as u64).to_le_bytes());
        out.extend_from_slice(&(self.config.leaf_capacity as u64).to_le_bytes());

        let leaf_bytes = self.arena.serialize();
        out.extend_from_slice(&(leaf_bytes.len() as u64).to_le_bytes());
        out.extend_from_slice(&leaf_bytes);

        out.extend_from_slice(&self.models.serialize()?);
        Ok(out)
    }

    /// Inverse of [`RolexEngine::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 40 {
            return Err(RolexError::Decode("engine header truncated".into()));
        }
        let epsilon = u64::from_le_bytes(bytes[0..8].try_into().unwrap()) as usize;
        let syn_max = u64::from_le_bytes(bytes[8..16].try_into().unwrap()) as usize;
        let upper_reserved = u64::from_le_bytes(bytes[16..24].try_into().unwrap()) as usize;
        let leaf_capacity = u64::from_le_bytes(bytes[24..32].try_into().unwrap()) as usize;
        let leaf_len = u64::from_le_bytes(bytes[32..40].try_into().unwrap()) as usize;

        let leaf_start = 40;
        if bytes.len() < leaf_start + leaf_len {
            return Err(RolexError::Decode("leaf arena body truncated".into()));
        }
        let arena = LeafArena::<N>::deserialize(&bytes[leaf_start..leaf_start + leaf_len])?;
        let models = ModelArena::<N>::deserialize(
            &bytes[leaf_start + leaf_len..],
            upper_reserved,
            syn_max,
        )?;

        let config = RolexConfig {
            epsilon,
            syn_max,
            upper_reserved,
            leaf_capacity,
        };
        Ok(Self {
            arena,
            models,
            config,
        })
    }
}

/// Runs the streaming PLR builder over the whole (key, global-rank) stream
/// and returns each closed segment as `(slope, intercept, start_idx,
/// end_idx)`, where `intercept` is still expressed against the *global*
/// rank — callers rebase it per submodel.
fn plr_segments(keys: &[u64], epsilon: usize) -> Vec<(f64, f64, usize, usize)> {
    let mut plr = PlrBuilder::new(epsilon);
    let mut segments = Vec::new();
    let mut seg_start = 0usize;
    for (i, &key) in keys.iter().enumerate() {
        if let Some(seg) = plr.add_point(key, i as i64) {
            segments.push((seg.slope, seg.intercept as f64, seg_start, i));
            seg_start = i;
        }
    }
    if let Some(seg) = plr.finish() {
        segments.push((seg.slope, seg.intercept as f64, seg_start, keys.len()));
    }
    segments
}
