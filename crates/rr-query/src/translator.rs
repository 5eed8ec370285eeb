//! Criteria Translator: criteria maps to WHERE predicates, joins and
//! bound parameters on a [`QueryPlan`].
//!
//! Translation runs in three steps:
//!
//! 1. **Key rewriting**: criteria aliases rename or drop incoming keys, then
//!    foreign criteria rules replace virtual keys with real field paths and
//!    contribute their selects and joins.
//! 2. **Field resolution**: each key becomes a quoted SQL expression on the
//!    root alias, an association alias (joined automatically) or a join alias
//!    declared by a rule.
//! 3. **Dispatch**: each input is parsed into a [`Criterion`] and bound as a
//!    [`Predicate`].

use crate::criteria::Criteria;
use crate::criterion::Criterion;
use crate::error::{QueryError, QueryResult};
use crate::plan::{Join, Predicate, QueryPlan, SortDirection, ROOT_ALIAS};
use crate::validate::{validate_join, validate_select};
use rr_core::sql_utils::{is_valid_ident, quote_ident, split_path};
use rr_core::{
    EntityMetadata, ForeignCriterionRule, IdentifierLookup, JoinKind, MetadataRegistry,
    RepositoryConfig,
};
use std::collections::BTreeMap;

/// A field path resolved to SQL
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub expr: String,
    /// Joins the expression depends on
    pub joins: Vec<Join>,
}

/// Per-entity criteria translator, built once per repository
#[derive(Debug, Clone)]
pub struct CriteriaTranslator {
    root: EntityMetadata,
    /// Owning associations of the root, with their target metadata
    targets: BTreeMap<String, EntityMetadata>,
    rules: BTreeMap<String, ForeignCriterionRule>,
    aliases: BTreeMap<String, Option<String>>,
    /// Joins declared by rules, keyed by alias
    rule_joins: BTreeMap<String, Join>,
}

impl CriteriaTranslator {
    /// Build the translator for `entity`, validating every configured
    /// select and join fragment.
    pub fn new(
        registry: &MetadataRegistry,
        entity: &str,
        config: &RepositoryConfig,
    ) -> QueryResult<Self> {
        let root = registry.require(entity)?.clone();

        let mut targets = BTreeMap::new();
        for assoc in root.associations.iter().filter(|a| a.is_owning()) {
            if let Some(target) = registry.get(&assoc.target) {
                targets.insert(assoc.name.clone(), target.clone());
            }
        }

        let mut rule_joins = BTreeMap::new();
        for (key, rule) in &config.foreign_criteria {
            for select in &rule.select {
                validate_select(select)?;
            }
            for join in &rule.joins {
                validate_join(join)?;
                if join.alias == ROOT_ALIAS {
                    return Err(QueryError::InvalidFragment {
                        fragment: join.on.clone(),
                        message: format!(
                            "criteria key '{}' joins with the reserved alias '{}'",
                            key, ROOT_ALIAS
                        ),
                    });
                }
                rule_joins.insert(
                    join.alias.clone(),
                    Join {
                        kind: join.kind,
                        table: join.table.clone(),
                        alias: join.alias.clone(),
                        on: join.on.clone(),
                    },
                );
            }
        }

        Ok(Self {
            root,
            targets,
            rules: config.foreign_criteria.clone(),
            aliases: config.criteria_aliases.clone(),
            rule_joins,
        })
    }

    pub fn entity(&self) -> &EntityMetadata {
        &self.root
    }

    /// Apply criteria aliases and foreign criteria rules.
    ///
    /// Returns the rewritten criteria plus the extra selects and joins the
    /// triggered rules contribute.
    pub fn rewrite_keys(&self, mut criteria: Criteria) -> (Criteria, Vec<String>, Vec<Join>) {
        for (key, alias) in &self.aliases {
            if !criteria.contains_key(key) {
                continue;
            }
            match alias {
                Some(new_key) => {
                    if criteria.contains_key(new_key) {
                        log::warn!(
                            "Criteria key '{}' renamed onto existing key '{}'; the earlier value is replaced",
                            key,
                            new_key
                        );
                    }
                    log::debug!("Criteria key '{}' renamed to '{}'", key, new_key);
                    criteria.rename(key, new_key);
                }
                None => {
                    log::debug!("Criteria key '{}' dropped", key);
                    criteria.remove(key);
                }
            }
        }

        let mut selects = Vec::new();
        let mut joins = Vec::new();
        let keys: Vec<String> = criteria.keys().map(str::to_string).collect();
        for key in keys {
            let Some(rule) = self.rules.get(&key) else {
                continue;
            };
            log::debug!("Criteria key '{}' expands to '{}'", key, rule.field);
            criteria.rename(&key, &rule.field);
            selects.extend(rule.select.iter().cloned());
            for join in &rule.joins {
                if let Some(j) = self.rule_joins.get(&join.alias) {
                    joins.push(j.clone());
                }
            }
        }

        (criteria, selects, joins)
    }

    /// Resolve a field path (`name`, `e.name`, `team.name`, `t.name`) to a
    /// SQL expression plus the joins it needs.
    pub fn resolve_field(&self, path: &str) -> QueryResult<ResolvedField> {
        let (qualifier, field) = split_path(path);
        let invalid = |entity: &EntityMetadata| QueryError::InvalidField {
            field: path.to_string(),
            entity: entity.name.to_string(),
        };

        if !is_valid_ident(field) {
            return Err(invalid(&self.root));
        }

        match qualifier {
            None | Some(ROOT_ALIAS) => {
                let column = self.root.column_for(field).ok_or_else(|| invalid(&self.root))?;
                Ok(ResolvedField {
                    expr: format!("{}.{}", ROOT_ALIAS, quote_ident(&column)),
                    joins: Vec::new(),
                })
            }
            Some(alias) if self.rule_joins.contains_key(alias) => Ok(ResolvedField {
                expr: format!("{}.{}", alias, quote_ident(field)),
                joins: self.rule_joins.get(alias).cloned().into_iter().collect(),
            }),
            Some(alias) => {
                let target = self.targets.get(alias).ok_or_else(|| QueryError::UnknownAlias {
                    alias: alias.to_string(),
                    field: path.to_string(),
                })?;
                let column = target.column_for(field).ok_or_else(|| invalid(target))?;
                Ok(ResolvedField {
                    expr: format!("{}.{}", quote_ident(alias), quote_ident(&column)),
                    joins: vec![self.association_join(alias, target)?],
                })
            }
        }
    }

    /// Inner join from the root to the target of an owning association,
    /// aliased by the quoted association name so keywords such as `order`
    /// stay usable.
    fn association_join(&self, alias: &str, target: &EntityMetadata) -> QueryResult<Join> {
        let join_column = self
            .root
            .association(alias)
            .and_then(|a| a.join_column())
            .ok_or_else(|| QueryError::UnknownAlias {
                alias: alias.to_string(),
                field: alias.to_string(),
            })?;
        let quoted = quote_ident(alias);
        Ok(Join {
            kind: JoinKind::Inner,
            table: target.table.clone(),
            alias: quoted.clone(),
            on: format!(
                "{}.{} = {}.{}",
                quoted,
                quote_ident(&target.id_field),
                ROOT_ALIAS,
                quote_ident(&join_column)
            ),
        })
    }

    /// Translate `criteria` onto `plan`.
    pub fn apply(
        &self,
        mut plan: QueryPlan,
        criteria: Criteria,
        lookup: &dyn IdentifierLookup,
    ) -> QueryResult<QueryPlan> {
        let (criteria, selects, joins) = self.rewrite_keys(criteria);
        for select in selects {
            plan = plan.select(select);
        }
        for join in joins {
            plan = plan.join(join);
        }

        for (key, input) in criteria {
            let resolved = self.resolve_field(&key)?;
            let criterion = Criterion::parse(&key, input)?;
            for join in resolved.joins {
                plan = plan.join(join);
            }
            plan = plan.filter(Predicate::from_criterion(
                resolved.expr,
                &key,
                &criterion,
                lookup,
            )?);
        }
        Ok(plan)
    }

    /// Apply `(field, direction)` sort terms in order.
    pub fn apply_order<F, D>(&self, mut plan: QueryPlan, order_by: &[(F, D)]) -> QueryResult<QueryPlan>
    where
        F: AsRef<str>,
        D: AsRef<str>,
    {
        for (field, direction) in order_by {
            let field = field.as_ref();
            let direction = SortDirection::parse(field, direction.as_ref())?;
            let resolved = self.resolve_field(field)?;
            for join in resolved.joins {
                plan = plan.join(join);
            }
            plan = plan.order_by(resolved.expr, direction);
        }
        Ok(plan)
    }
}

/// Parse a JSON `{field: direction}` object into ordered sort terms.
pub fn order_by_from_json(json: &serde_json::Value) -> QueryResult<Vec<(String, String)>> {
    match json {
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(field, direction)| match direction {
                serde_json::Value::String(d) => Ok((field.clone(), d.clone())),
                other => Err(QueryError::InvalidSortDirection {
                    field: field.clone(),
                    direction: other.to_string(),
                }),
            })
            .collect(),
        other => Err(QueryError::NotAnObject {
            found: other.to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "translator_test.rs"]
mod tests;
