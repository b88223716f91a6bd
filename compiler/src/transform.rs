//! Attribute transforms: caller supplied rewrites of literal attribute and
//! option values, looked up by attribute name.

use crate::options::Options;

use data_structures::HashMap;

use std::fmt;

/// Where the transformed value is going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformTarget<'a> {
    /// An attribute of the named tag
    Tag(&'a str),
    /// An option passed to `extends` or `include`
    Option,
}

/// Returns the replacement value, or `None` to keep the default handling.
pub type TransformFn = dyn Fn(&str, TransformTarget<'_>, &Options) -> Option<String>;

#[derive(Default)]
pub struct Transforms {
    by_name: HashMap<String, Box<TransformFn>>,
}

impl Transforms {
    pub fn new() -> Self {
        Transforms::default()
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: Fn(&str, TransformTarget<'_>, &Options) -> Option<String> + 'static,
    {
        self.by_name.insert(name.into(), Box::new(transform));
    }

    pub fn with<F>(mut self, name: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&str, TransformTarget<'_>, &Options) -> Option<String> + 'static,
    {
        self.insert(name, transform);
        self
    }

    /// Run the transform registered for `name`, if any.
    pub fn apply(
        &self,
        name: &str,
        value: &str,
        target: TransformTarget<'_>,
        options: &Options,
    ) -> Option<String> {
        self.by_name
            .get(name)
            .and_then(|transform| transform(value, target, options))
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl fmt::Debug for Transforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.by_name.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_by_name() {
        let transforms = Transforms::new().with("src", |value, target, options| {
            match target {
                TransformTarget::Tag("img") => Some(format!("/cdn/{}{}", value, options.ext)),
                _ => None,
            }
        });
        let options = Options::default();
        assert_eq!(
            transforms.apply("src", "a", TransformTarget::Tag("img"), &options),
            Some("/cdn/a.made".to_string())
        );
        assert_eq!(transforms.apply("src", "a", TransformTarget::Option, &options), None);
        assert_eq!(transforms.apply("href", "a", TransformTarget::Tag("img"), &options), None);
    }
}
