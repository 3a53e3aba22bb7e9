//! Binding resolver
//!
//! Resolves locator bindings and attribute values out of the scoped store.
//! Attribute lookup scans the visible entries for the first non-empty
//! binding of a recognised kind, evaluates it, and otherwise falls back to
//! the default resolver and then to the live text of the named element.
//!
//! Every nested lookup (interpolated references, XPath/regex/JSON path
//! sources, locator containers) increases a depth counter; passing the
//! configured limit fails with `InterpolationDepthExceeded` instead of
//! recursing forever on cyclic bindings.

use action_primitives::primitives::{read_text, selected_option};
use action_primitives::ElementInteractor;
use async_recursion::async_recursion;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use webbind_core_types::{keys, LocatorBinding, LocatorStrategy, SelectionKind, CURRENT_URL};
use webbind_scope_store::ScopedStore;

use crate::attribute::{AttributeKind, BoundAttribute, TargetType};
use crate::defaults::DefaultResolver;
use crate::errors::BindingError;
use crate::evaluators::{return_script, Evaluators};
use crate::interpolate::{dry_value, parse_template, Segment, DRY_VALUE_PREFIX};

/// Resolution behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Never touch the live page; live values become `$[dryValue:<name>]`
    pub dry_run: bool,
    /// Deepest nesting of lookups before resolution is abandoned
    pub max_depth: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_depth: 16,
        }
    }
}

pub struct BindingResolver {
    store: Arc<dyn ScopedStore>,
    interactor: ElementInteractor,
    evaluators: Arc<dyn Evaluators>,
    defaults: Arc<dyn DefaultResolver>,
    options: ResolverOptions,
    // `<name>/text` keys written by live reads, with the text written
    live_reads: Mutex<HashMap<String, String>>,
}

impl BindingResolver {
    pub fn new(
        store: Arc<dyn ScopedStore>,
        interactor: ElementInteractor,
        evaluators: Arc<dyn Evaluators>,
        defaults: Arc<dyn DefaultResolver>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            store,
            interactor,
            evaluators,
            defaults,
            options,
            live_reads: Mutex::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Locator binding for `element`, with its expression interpolated and
    /// its container resolved.
    pub async fn locator_binding(&self, element: &str) -> Result<LocatorBinding, BindingError> {
        self.locator_at(element, 0).await
    }

    /// Value bound to `name`; never empty by omission, it either resolves
    /// or fails.
    pub async fn get_attribute(&self, name: &str) -> Result<String, BindingError> {
        self.attribute_at(name, 0).await
    }

    /// Like [`get_attribute`](Self::get_attribute), with `the current URL`
    /// read fresh from the page first.
    pub async fn get_bound_reference_value(&self, name: &str) -> Result<String, BindingError> {
        self.reference_at(name, 0).await
    }

    /// Replace every `$[name]` reference in `template` with its value.
    pub async fn interpolate(&self, template: &str) -> Result<String, BindingError> {
        self.interpolate_at(template, 0).await
    }

    /// Blank every `<name>/text` cached by a live read so the next read of
    /// any of them goes to the page. Entries rebound since are left alone.
    pub fn forget_live_text(&self) {
        let cached = std::mem::take(&mut *self.live_reads.lock());
        for (key, text) in cached {
            if self.store.get_opt(&key).is_some_and(|current| current == text) {
                debug!(key = %key, "dropping cached live text");
                self.store.set(&key, "");
            }
        }
    }

    /// Selected text or value of a dropdown, bound back under
    /// `<name>/selectedText` or `<name>/selectedValue`.
    pub async fn get_element_selection(
        &self,
        name: &str,
        kind: SelectionKind,
    ) -> Result<String, BindingError> {
        let key = keys::selection(name, kind);
        let binding = self.locator_binding(name).await?;
        if self.options.dry_run {
            let value = dry_value(&key);
            self.store.set(&key, &value);
            return Ok(value);
        }

        let selected = self
            .interactor
            .with_element(None, &binding, move |element| async move {
                selected_option(&element, kind).await
            })
            .await?;
        let value = selected.ok_or_else(|| BindingError::UnboundAttribute(key.clone()))?;
        self.store.set(&key, &value);
        Ok(value)
    }

    fn guard(&self, name: &str, depth: usize) -> Result<(), BindingError> {
        if depth > self.options.max_depth {
            return Err(BindingError::InterpolationDepthExceeded {
                name: name.to_string(),
                limit: self.options.max_depth,
            });
        }
        Ok(())
    }

    fn bound(&self, key: &str) -> Option<String> {
        self.store
            .get_opt(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    #[async_recursion]
    async fn locator_at(&self, element: &str, depth: usize) -> Result<LocatorBinding, BindingError> {
        self.guard(element, depth)?;

        let locator_key = keys::locator(element);
        let strategy_name =
            self.bound(&locator_key)
                .ok_or_else(|| BindingError::LocatorBindingNotFound {
                    element: element.to_string(),
                    key: locator_key.clone(),
                })?;
        let strategy =
            LocatorStrategy::parse(&strategy_name).map_err(|err| BindingError::Evaluation {
                name: element.to_string(),
                kind: "locator".to_string(),
                reason: err.to_string(),
            })?;

        let expression_key = keys::locator_expression(element, &strategy_name);
        let raw_expression =
            self.bound(&expression_key)
                .ok_or_else(|| BindingError::LocatorBindingNotFound {
                    element: element.to_string(),
                    key: expression_key.clone(),
                })?;
        let expression = self.interpolate_at(&raw_expression, depth + 1).await?;

        let mut binding = LocatorBinding::new(element, strategy, expression);
        if let Some(container) = self.bound(&keys::locator_container(element, &strategy_name)) {
            if self.options.dry_run {
                let key = keys::locator(&container);
                if self.bound(&key).is_none() {
                    return Err(BindingError::LocatorBindingNotFound {
                        element: container,
                        key,
                    });
                }
            } else {
                let container = self.locator_at(&container, depth + 1).await?;
                binding = binding.within(container);
            }
        }

        debug!(binding = %binding, "resolved locator binding");
        Ok(binding)
    }

    #[async_recursion]
    async fn reference_at(&self, name: &str, depth: usize) -> Result<String, BindingError> {
        if name == CURRENT_URL {
            let url = if self.options.dry_run {
                dry_value(name)
            } else {
                self.interactor.driver().current_url().await.map_err(|err| {
                    BindingError::Action(err.into())
                })?
            };
            self.store.set(name, &url);
        }
        self.attribute_at(name, depth).await
    }

    #[async_recursion]
    async fn interpolate_at(&self, template: &str, depth: usize) -> Result<String, BindingError> {
        let mut out = String::with_capacity(template.len());
        for segment in parse_template(template) {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Reference(name) if name.starts_with(DRY_VALUE_PREFIX) => {
                    out.push_str("$[");
                    out.push_str(name);
                    out.push(']');
                }
                Segment::Reference(name) => {
                    self.guard(name, depth)?;
                    let value = self.reference_at(name.trim(), depth + 1).await?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }

    /// First non-empty binding of a recognised kind, innermost scope and
    /// most recent binding first.
    fn scan(&self, name: &str) -> Result<Option<BoundAttribute>, BindingError> {
        let found = self
            .store
            .visible_entries_with_prefix(name)
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .find_map(|(key, value)| AttributeKind::match_key(name, &key).map(|kind| (kind, value)));

        let Some((kind, value)) = found else {
            return Ok(None);
        };

        let field = |kind_key: fn(&str, &str) -> String, field: &str| {
            let key = kind_key(name, field);
            self.store
                .get_opt(&key)
                .filter(|value| !value.is_empty())
                .ok_or(BindingError::UnboundAttribute(key))
        };

        let attribute = match kind {
            AttributeKind::Literal | AttributeKind::Text => BoundAttribute::Literal(value),
            AttributeKind::JavaScript => BoundAttribute::Script(value),
            AttributeKind::SysProc => BoundAttribute::SysProc(value),
            AttributeKind::File => BoundAttribute::File(value),
            AttributeKind::XPath => BoundAttribute::XPath {
                source: field(keys::xpath_field, "source")?,
                expression: field(keys::xpath_field, "expression")?,
                target_type: self
                    .bound(&keys::xpath_field(name, "targetType"))
                    .unwrap_or_else(|| TargetType::Text.name().to_string()),
            },
            AttributeKind::Regex => BoundAttribute::Regex {
                source: field(keys::regex_field, "source")?,
                expression: field(keys::regex_field, "expression")?,
            },
            AttributeKind::JsonPath => BoundAttribute::JsonPath {
                source: field(keys::json_path_field, "source")?,
                expression: field(keys::json_path_field, "expression")?,
            },
        };
        Ok(Some(attribute))
    }

    #[async_recursion]
    async fn attribute_at(&self, name: &str, depth: usize) -> Result<String, BindingError> {
        self.guard(name, depth)?;

        if let Some(attribute) = self.scan(name)? {
            debug!(name, kind = %attribute.kind(), "resolving bound attribute");
            return self.evaluate(name, attribute, depth).await;
        }

        if let Some(value) = self.defaults.resolve(name) {
            return Ok(value);
        }

        let binding = match self.locator_at(name, depth + 1).await {
            Ok(binding) => binding,
            Err(BindingError::LocatorBindingNotFound { .. }) => {
                return Err(BindingError::UnboundAttribute(name.to_string()));
            }
            Err(err) => return Err(err),
        };
        self.live_text(&binding).await
    }

    async fn live_text(&self, binding: &LocatorBinding) -> Result<String, BindingError> {
        if self.options.dry_run {
            return Ok(dry_value(&binding.element));
        }
        let text = self
            .interactor
            .with_element(None, binding, |element| async move { read_text(&element).await })
            .await?;
        info!(element = %binding.element, "read live element text");
        let key = keys::text(&binding.element);
        self.store.set(&key, &text);
        self.live_reads.lock().insert(key, text.clone());
        Ok(text)
    }

    async fn evaluate(
        &self,
        name: &str,
        attribute: BoundAttribute,
        depth: usize,
    ) -> Result<String, BindingError> {
        let kind = attribute.kind();
        let eval = self.evaluators.as_ref();
        let next = depth + 1;

        let result = match attribute {
            BoundAttribute::Literal(value) => return Ok(value),
            BoundAttribute::Script(script) => {
                let script = self.interpolate_at(&script, next).await?;
                if self.options.dry_run {
                    return Ok(dry_value(name));
                }
                eval.execute_script(&return_script(&script), &[]).await
            }
            BoundAttribute::XPath {
                source,
                expression,
                target_type,
            } => {
                let source = self.source_value(&source, next).await?;
                let expression = self.interpolate_at(&expression, next).await?;
                let target = self
                    .interpolate_at(&target_type, next)
                    .await?
                    .parse::<TargetType>()
                    .map_err(|reason| BindingError::Evaluation {
                        name: name.to_string(),
                        kind: kind.to_string(),
                        reason,
                    })?;
                if self.options.dry_run {
                    return Ok(dry_value(name));
                }
                eval.evaluate_xpath(&expression, &source, target).await
            }
            BoundAttribute::Regex { source, expression } => {
                let source = self.source_value(&source, next).await?;
                let expression = self.interpolate_at(&expression, next).await?;
                if self.options.dry_run {
                    return Ok(dry_value(name));
                }
                eval.extract_by_regex(&expression, &source).await
            }
            BoundAttribute::JsonPath { source, expression } => {
                let source = self.source_value(&source, next).await?;
                let expression = self.interpolate_at(&expression, next).await?;
                if self.options.dry_run {
                    return Ok(dry_value(name));
                }
                eval.evaluate_json_path(&expression, &source).await
            }
            BoundAttribute::SysProc(command) => {
                let command = self.interpolate_at(&command, next).await?;
                if self.options.dry_run {
                    return Ok(dry_value(name));
                }
                eval.run_process(&command).await
            }
            BoundAttribute::File(path) => {
                let path = self.interpolate_at(&path, next).await?;
                eval.read_file(&path).await
            }
        };

        result.map_err(|err| err.for_binding(name, kind.name()))
    }

    /// Sources name another binding; resolve that binding's value.
    async fn source_value(&self, source: &str, depth: usize) -> Result<String, BindingError> {
        let source = self.interpolate_at(source, depth).await?;
        self.reference_at(source.trim(), depth + 1).await
    }
}
