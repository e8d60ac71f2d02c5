use std::sync::{Arc, LazyLock};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::debug;
use crate::error::Result;
use crate::reader::{DEFAULT_CLOSE_DELIMITER, DEFAULT_OPEN_DELIMITER};
use crate::template::{Template, TemplateStore};
use crate::Value;


/// Process-wide cache used by [`render_cached`].
pub static TEMPLATE_CACHE: LazyLock<TemplateCache> = LazyLock::new(TemplateCache::new);

type CacheKey = (String, String, String);


/// Parsed templates keyed by source text and initial delimiters.
///
/// A template is built at most once per key, and every lookup of the same
/// key shares one [`Arc`]. Sources that fail to parse are not cached.
#[derive(Debug, Default)]
pub struct TemplateCache {
    templates: DashMap<CacheKey, Arc<Template>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        TemplateCache {
            templates: DashMap::new()
        }
    }

    pub fn get_or_parse(&self, input: &str) -> Result<Arc<Template>> {
        self.get_or_parse_with(input, DEFAULT_OPEN_DELIMITER, DEFAULT_CLOSE_DELIMITER)
    }

    pub fn get_or_parse_with(
        &self, input: &str, open_delimiter: &str, close_delimiter: &str
    ) -> Result<Arc<Template>> {
        let key = (input.to_owned(), open_delimiter.to_owned(), close_delimiter.to_owned());
        // the entry holds its shard locked until the template is inserted
        match self.templates.entry(key) {
            Entry::Occupied(entry) => {
                debug!("template cache hit");
                Ok(Arc::clone(entry.get()))
            },
            Entry::Vacant(entry) => {
                debug!("template cache miss");
                let template = Arc::new(Template::parse_with(input, open_delimiter, close_delimiter)?);
                entry.insert(Arc::clone(&template));
                Ok(template)
            }
        }
    }

    /// Drops one entry; returns whether it was cached.
    pub fn invalidate(&self, input: &str, open_delimiter: &str, close_delimiter: &str) -> bool {
        let key = (input.to_owned(), open_delimiter.to_owned(), close_delimiter.to_owned());
        self.templates.remove(&key).is_some()
    }

    pub fn clear(&self) {
        self.templates.clear();
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}


/// Renders `input` through [`TEMPLATE_CACHE`].
pub fn render_cached(input: &str, data: &Value, partials: &dyn TemplateStore) -> Result<String> {
    TEMPLATE_CACHE.get_or_parse(input)?.render_with_partials(data, partials)
}

pub fn cache_clear() {
    TEMPLATE_CACHE.clear();
}
