//! `CREATE VIEW` and `DROP VIEW`

use tracing::debug;

use crate::error::{Error, Result};
use crate::plan::LogicalPlan;
use crate::schema::QualifiedName;
use crate::session::Context;
use crate::view_registry::{View, ViewKey};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateView {
    pub name: QualifiedName,
    /// View body, a `SubqueryAlias` named after the view
    pub definition: Box<LogicalPlan>,
    /// SQL text of the view body
    pub text: String,
    pub or_replace: bool,
}

impl CreateView {
    pub(crate) fn execute(&self, ctx: &Context) -> Result<()> {
        let database = ctx.database_for(&self.name)?;
        let view = View::new(&self.name.name, (*self.definition).clone(), &self.text);

        if self.or_replace {
            match ctx.views().delete(&database, &self.name.name) {
                Ok(()) | Err(Error::NonExistingView { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        ctx.views().register(&database, view)?;
        debug!(database = %database, view = %self.name.name, "created view");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropView {
    pub views: Vec<QualifiedName>,
    pub if_exists: bool,
}

impl DropView {
    pub(crate) fn execute(&self, ctx: &Context) -> Result<()> {
        let keys = self
            .views
            .iter()
            .map(|name| Ok(ViewKey::new(ctx.database_for(name)?, &name.name)))
            .collect::<Result<Vec<_>>>()?;
        ctx.views().delete_list(&keys, !self.if_exists)
    }
}
