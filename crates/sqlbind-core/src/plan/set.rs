//! `SET` statement

use tracing::debug;

use crate::error::{Error, Result};
use crate::expression::{Expr, SystemVar, VariableScope};
use crate::session::Context;
use crate::types::Row;

/// `SET a = x, @@b = y, ...`; every expression is a `SetField`
#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    pub exprs: Vec<Expr>,
}

impl Set {
    pub fn new(exprs: Vec<Expr>) -> Self {
        Self { exprs }
    }

    /// Whether any assignment targets a global variable
    pub fn sets_global(&self) -> bool {
        self.exprs.iter().any(|expr| {
            matches!(expr, Expr::SetField(field)
                if matches!(field.left.as_ref(), Expr::SystemVar(var) if var.scope == VariableScope::Global))
        })
    }

    /// Apply the assignments in order
    pub(crate) fn row_iter(&self, ctx: &Context, row: &Row) -> Result<Vec<Row>> {
        for expr in &self.exprs {
            let Expr::SetField(field) = expr else {
                return Err(Error::Unsupported(format!("SET of {}", expr)));
            };

            match field.left.as_ref() {
                Expr::SystemVar(var) => set_system_variable(ctx, var, &field.right, row)?,
                Expr::UserVar(var) => {
                    if matches!(field.right.as_ref(), Expr::Default) {
                        return Err(Error::InvalidVariableValue {
                            name: var.name.clone(),
                            value: "DEFAULT".to_string(),
                        });
                    }
                    let value = field.right.eval(ctx, row)?;
                    debug!(variable = %var.name, value = %value, "set user variable");
                    ctx.session().set_user_variable(&var.name, value);
                }
                other => return Err(Error::NotResolved(other.to_string())),
            }
        }
        Ok(vec![])
    }
}

fn set_system_variable(ctx: &Context, var: &SystemVar, right: &Expr, row: &Row) -> Result<()> {
    let is_default = matches!(right, Expr::Default);
    match (var.scope, is_default) {
        (VariableScope::Session, true) => ctx.session().set_variable_default(&var.name),
        (VariableScope::Session, false) => {
            let value = right.eval(ctx, row)?;
            ctx.session().set_variable(&var.name, value)
        }
        (VariableScope::Global, true) => ctx.globals().set_global_default(&var.name),
        (VariableScope::Global, false) => {
            let value = right.eval(ctx, row)?;
            ctx.globals().set_global(&var.name, value)
        }
    }
}
