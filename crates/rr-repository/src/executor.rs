//! Query execution
//!
//! Builds the root query of a repository, runs rendered plans against the
//! session's connection and turns the rows into entity handles or scalars.

use crate::error::RepositoryResult;
use rr_core::{EntityKey, EntityName, Value};
use rr_db::Session;
use rr_query::{
    CriteriaTranslator, Criteria, PlaceholderStyle, QueryPlan, RenderedQuery, SortDirection,
    ROOT_ALIAS,
};
use std::rc::Rc;

/// Aggregate functions usable through [`QueryExecutor::aggregate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Min,
    Max,
}

impl Aggregate {
    fn as_sql(&self) -> &'static str {
        match self {
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }
}

/// Runs queries for one entity type
pub struct QueryExecutor {
    session: Rc<Session>,
    translator: CriteriaTranslator,
    entity: EntityName,
    /// Qualified identifying column, e.g. `e."id"`
    id_expr: String,
}

impl QueryExecutor {
    pub fn new(
        session: Rc<Session>,
        translator: CriteriaTranslator,
        id_column: &str,
    ) -> RepositoryResult<Self> {
        let entity = translator.entity().name.clone();
        let id_expr = translator.resolve_field(id_column)?.expr;
        Ok(Self {
            session,
            translator,
            entity,
            id_expr,
        })
    }

    pub fn translator(&self) -> &CriteriaTranslator {
        &self.translator
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// `SELECT DISTINCT` over every column of the root entity
    pub fn base_plan(&self) -> RepositoryResult<QueryPlan> {
        let meta = self.translator.entity();
        Ok(QueryPlan::new(meta.table.clone())
            .distinct(true)
            .with_select(self.session.select_list(&meta.name, ROOT_ALIAS)?))
    }

    /// Entity select with criteria, ordering and pagination applied.
    pub fn select_plan<F, D>(
        &self,
        criteria: Criteria,
        order_by: &[(F, D)],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> RepositoryResult<QueryPlan>
    where
        F: AsRef<str>,
        D: AsRef<str>,
    {
        let plan = self
            .translator
            .apply(self.base_plan()?, criteria, &*self.session)?;
        let mut plan = self.translator.apply_order(plan, order_by)?;
        // SELECT DISTINCT can only order by selected expressions
        let order_exprs: Vec<String> = plan.order_bys().iter().map(|o| o.expr.clone()).collect();
        for expr in order_exprs {
            plan = plan.select(expr);
        }
        Ok(plan.limit(limit).offset(offset))
    }

    /// Run an entity select, hydrating each row once. Row order is kept.
    pub fn fetch(&self, plan: &QueryPlan) -> RepositoryResult<Vec<EntityKey>> {
        let rows = self.run(plan)?;
        let mut keys = Vec::with_capacity(rows.len());
        for row in &rows {
            let key = self.session.hydrate(&self.entity, row)?;
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        log::debug!("Fetched {} {} entities", keys.len(), self.entity);
        Ok(keys)
    }

    /// `COUNT(DISTINCT e.<id>)` over the matching rows
    pub fn count(&self, criteria: Criteria) -> RepositoryResult<i64> {
        let plan = self
            .translator
            .apply(self.base_plan()?, criteria, &*self.session)?
            .with_select(vec![format!("COUNT(DISTINCT {})", self.id_expr)])
            .distinct(false)
            .without_ordering();
        Ok(self.scalar(&plan)?.as_i64().unwrap_or(0))
    }

    /// `MIN`/`MAX` of a field path over the matching rows; `Null` when
    /// nothing matches.
    pub fn aggregate(
        &self,
        function: Aggregate,
        field: &str,
        criteria: Criteria,
    ) -> RepositoryResult<Value> {
        let resolved = self.translator.resolve_field(field)?;
        let mut plan = self
            .translator
            .apply(self.base_plan()?, criteria, &*self.session)?;
        for join in resolved.joins {
            plan = plan.join(join);
        }
        let plan = plan
            .with_select(vec![format!("{}({})", function.as_sql(), resolved.expr)])
            .distinct(false)
            .without_ordering();
        self.scalar(&plan)
    }

    /// Distinct values of a field path, ascending.
    pub fn distinct_values(&self, field: &str, criteria: Criteria) -> RepositoryResult<Vec<Value>> {
        let resolved = self.translator.resolve_field(field)?;
        let mut plan = self
            .translator
            .apply(self.base_plan()?, criteria, &*self.session)?;
        for join in resolved.joins {
            plan = plan.join(join);
        }
        let plan = plan
            .with_select(vec![resolved.expr.clone()])
            .distinct(true)
            .without_ordering()
            .order_by(resolved.expr, SortDirection::Asc);
        Ok(self
            .run(&plan)?
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect())
    }

    /// Render a plan the way it is sent to the connection.
    pub fn render(&self, plan: &QueryPlan) -> RenderedQuery {
        plan.render(PlaceholderStyle::Dollar)
    }

    fn run(&self, plan: &QueryPlan) -> RepositoryResult<Vec<Vec<Value>>> {
        let rendered = self.render(plan);
        let params: Vec<Value> = rendered.params.into_iter().map(|p| p.value).collect();
        log::debug!("Executing: {} {:?}", rendered.sql, params);
        Ok(self
            .session
            .connection()
            .query_rows(&rendered.sql, &params)?
            .rows)
    }

    fn scalar(&self, plan: &QueryPlan) -> RepositoryResult<Value> {
        Ok(self
            .run(plan)?
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
