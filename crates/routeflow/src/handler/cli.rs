//! Command-line argument handler.
//!
//! Routes can serve command-line invocations: the adaptation layer puts
//! the positional tokens on the request and this handler checks them
//! against a declared argument specification before any other work runs.
//! On a parse failure the usage text is written out and the dispatch
//! halts; the wrapped work function never runs. On success each token is
//! bound as a named parameter.

use super::{BoundFn, RouteHandler};
use crate::chain::Next;
use crate::flow::{Flow, FlowResult};
use crate::request::RequestContext;
use crate::response::ResponseContext;
use std::fmt::Write as _;
use tracing::debug;

/// One positional argument declaration.
#[derive(Debug, Clone)]
struct ArgSpec {
    name: String,
    required: bool,
}

/// Runs a work function behind a positional argument specification.
pub struct CliHandler {
    command: String,
    specs: Vec<ArgSpec>,
    run: BoundFn,
    before: Option<BoundFn>,
    after: Option<BoundFn>,
}

impl CliHandler {
    pub fn new<F>(command: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut ResponseContext) -> FlowResult + Send + Sync + 'static,
    {
        Self { command: command.into(), specs: Vec::new(), run: Box::new(run), before: None, after: None }
    }

    /// Declares a required positional argument. Declare these before any
    /// optional ones.
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.specs.push(ArgSpec { name: name.into(), required: true });
        self
    }

    /// Declares an optional positional argument.
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.specs.push(ArgSpec { name: name.into(), required: false });
        self
    }

    pub fn on_before<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut ResponseContext) -> FlowResult + Send + Sync + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    pub fn on_after<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut ResponseContext) -> FlowResult + Send + Sync + 'static,
    {
        self.after = Some(Box::new(f));
        self
    }

    /// Renders the one-line usage text for this command.
    pub fn usage(&self) -> String {
        let mut out = format!("usage: {}", self.command);
        for spec in &self.specs {
            if spec.required {
                let _ = write!(out, " <{}>", spec.name);
            } else {
                let _ = write!(out, " [{}]", spec.name);
            }
        }
        out.push('\n');
        out
    }

    /// Checks the tokens against the specification, returning the
    /// `(name, value)` bindings on success.
    fn parse(&self, tokens: &[String]) -> Result<Vec<(String, String)>, ()> {
        if tokens.len() > self.specs.len() {
            return Err(());
        }
        let mut bindings = Vec::with_capacity(tokens.len());
        for (index, spec) in self.specs.iter().enumerate() {
            match tokens.get(index) {
                Some(token) => bindings.push((spec.name.clone(), token.clone())),
                None if spec.required => return Err(()),
                None => break,
            }
        }
        Ok(bindings)
    }
}

impl RouteHandler for CliHandler {
    /// Argument parsing runs before everything else; a failure halts with
    /// the usage text and nothing downstream executes.
    fn before(&self, req: &mut RequestContext, res: &mut ResponseContext) -> FlowResult {
        match self.parse(req.args()) {
            Ok(bindings) => {
                for (name, value) in bindings {
                    req.push_param(name, value);
                }
            }
            Err(()) => {
                debug!(command = %self.command, "argument parse failed");
                res.write(self.usage());
                return Ok(res.end());
            }
        }
        match &self.before {
            Some(hook) => hook(req, res),
            None => Ok(Flow::Complete),
        }
    }

    fn handle(&self, req: &mut RequestContext, res: &mut ResponseContext, _next: Next<'_>) -> FlowResult {
        (self.run)(req, res)
    }

    fn after(&self, req: &mut RequestContext, res: &mut ResponseContext) -> FlowResult {
        match &self.after {
            Some(hook) => hook(req, res),
            None => Ok(Flow::Complete),
        }
    }
}

impl std::fmt::Debug for CliHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliHandler").field("command", &self.command).field("specs", &self.specs).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::CliHandler;
    use crate::flow::Flow;
    use crate::handler::RouteHandler;
    use crate::request::RequestContext;
    use crate::response::ResponseContext;

    fn handler() -> CliHandler {
        CliHandler::new("sync", |req, res| {
            res.write(format!("sync {} -> {}", req.param("source").unwrap_or("?"), req.param("dest").unwrap_or("-")));
            Ok(Flow::Complete)
        })
        .required("source")
        .optional("dest")
    }

    #[test]
    fn binds_tokens_as_params() {
        let handler = handler();
        let mut req = RequestContext::builder().args(["a", "b"]).build();
        let mut res = ResponseContext::new();

        assert_eq!(handler.before(&mut req, &mut res).unwrap(), Flow::Complete);
        assert_eq!(req.param("source"), Some("a"));
        assert_eq!(req.param("dest"), Some("b"));
    }

    #[test]
    fn optional_argument_may_be_absent() {
        let handler = handler();
        let mut req = RequestContext::builder().arg("a").build();
        let mut res = ResponseContext::new();

        assert_eq!(handler.before(&mut req, &mut res).unwrap(), Flow::Complete);
        assert_eq!(req.param("source"), Some("a"));
        assert!(req.param("dest").is_none());
    }

    #[test]
    fn missing_required_argument_halts_with_usage() {
        let handler = handler();
        let mut req = RequestContext::builder().build();
        let mut res = ResponseContext::new();

        assert_eq!(handler.before(&mut req, &mut res).unwrap(), Flow::Halt);
        assert_eq!(res.body(), "usage: sync <source> [dest]\n");
        assert!(res.is_finalized());
    }

    #[test]
    fn excess_arguments_halt_with_usage() {
        let handler = handler();
        let mut req = RequestContext::builder().args(["a", "b", "c"]).build();
        let mut res = ResponseContext::new();

        assert_eq!(handler.before(&mut req, &mut res).unwrap(), Flow::Halt);
        assert_eq!(res.body(), "usage: sync <source> [dest]\n");
    }
}
