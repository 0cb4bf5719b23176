use std::collections::BTreeMap;

use camfx_core::{FilterCode, LookupError, TextureTarget};

use crate::filter::FilterVariant;
use crate::gl::GlApi;

/// Owns one [`FilterVariant`] per enabled code, built eagerly with the context current.
#[derive(Debug)]
pub struct FilterRegistry<G: GlApi> {
    variants: BTreeMap<FilterCode, FilterVariant<G>>,
}

impl<G: GlApi> FilterRegistry<G> {
    /// Compiles every variant in `codes`.
    ///
    /// A variant whose shaders fail to build is logged and left out; lookups for it then
    /// report it as unsupported while the remaining variants stay usable.
    pub fn new(gl: &G, codes: &[FilterCode], target: TextureTarget) -> Self {
        let mut variants = BTreeMap::new();
        for &code in codes {
            if variants.contains_key(&code) {
                continue;
            }
            match FilterVariant::new(gl, code, target) {
                Ok(variant) => {
                    tracing::debug!(%code, "filter compiled");
                    variants.insert(code, variant);
                }
                Err(e) => tracing::error!(%code, error = %e, "filter unavailable"),
            }
        }
        Self { variants }
    }

    pub fn get(&self, code: FilterCode) -> Result<&FilterVariant<G>, LookupError> {
        self.variants
            .get(&code)
            .ok_or(LookupError::UnsupportedFilter(code))
    }

    pub fn get_mut(&mut self, code: FilterCode) -> Result<&mut FilterVariant<G>, LookupError> {
        self.variants
            .get_mut(&code)
            .ok_or(LookupError::UnsupportedFilter(code))
    }

    pub fn contains(&self, code: FilterCode) -> bool {
        self.variants.contains_key(&code)
    }

    /// Codes that built successfully, in declaration order.
    pub fn codes(&self) -> impl Iterator<Item = FilterCode> + '_ {
        self.variants.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Frees every variant's GPU objects. The registry is empty afterwards.
    pub fn destroy(&mut self, gl: &G) {
        for (_, variant) in std::mem::take(&mut self.variants) {
            variant.destroy(gl);
        }
    }
}
