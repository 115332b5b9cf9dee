pub mod output;
pub mod result;

pub use output::{BufferSink, OutputSink, StreamKind, TracingSink};
pub use result::CommandResult;

use crate::core::error::AppError;
use crate::core::types::{CompositeOperator, ErrorCategory};
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Rejection returned when `execute` is called on a command that is already
/// running. Distinct from a failed [`CommandResult`]: the in-flight execution
/// is not affected and no result is produced for the rejected call.
#[derive(Debug, thiserror::Error)]
#[error("'{description}' command is already running")]
pub struct AlreadyRunning {
    pub description: String,
}

/// Transformer applied to a fault before the failure result is built.
/// Transformers compose in registration order; the engine installs one that
/// unwraps a single completion-wrapper layer.
pub type FaultTransformer = dyn Fn(AppError) -> AppError + Send + Sync;

/// Execution body of a leaf command.
#[async_trait]
pub trait CommandAction: Send + Sync {
    async fn run(&self, ctx: &CommandContext) -> Result<(), AppError>;
}

/// What a leaf action sees while running: its identity plus the registered
/// output sinks.
#[derive(Clone)]
pub struct CommandContext {
    description: String,
    scope: String,
    sinks: Vec<Arc<dyn OutputSink>>,
}

impl CommandContext {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn sinks(&self) -> &[Arc<dyn OutputSink>] {
        &self.sinks
    }

    pub fn emit(&self, kind: StreamKind, line: &str) {
        for sink in &self.sinks {
            sink.line(kind, line);
        }
    }
}

struct FnAction<F>(F);

#[async_trait]
impl<F> CommandAction for FnAction<F>
where
    F: Fn(CommandContext) -> futures::future::BoxFuture<'static, Result<(), AppError>>
        + Send
        + Sync,
{
    async fn run(&self, ctx: &CommandContext) -> Result<(), AppError> {
        (self.0)(ctx.clone()).await
    }
}

enum CommandKind {
    Leaf(Arc<dyn CommandAction>),
    Composite {
        operator: CompositeOperator,
        left: Command,
        right: Command,
    },
}

struct Inner {
    description: String,
    scope: String,
    print_description: AtomicBool,
    started: AtomicBool,
    sinks: Mutex<Vec<Arc<dyn OutputSink>>>,
    transformers: Mutex<Vec<Arc<FaultTransformer>>>,
    cleanup: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
    kind: CommandKind,
}

/// A named unit of work against a scope (worktree, repository, configuration).
///
/// Cloning yields another handle to the same command instance: the started
/// flag, sinks, and transformers are shared. At most one execution runs at a
/// time per instance; the loser of a start race gets an immediate
/// [`AlreadyRunning`] rejection. Every execution resolves to exactly one
/// [`CommandResult`]; faults never escape as raw errors. There is no retry
/// and no cancellation inside the engine.
#[derive(Clone)]
pub struct Command {
    inner: Arc<Inner>,
}

impl Command {
    pub fn new<S, D>(scope: S, description: D, action: Arc<dyn CommandAction>) -> Self
    where
        S: Into<String>,
        D: Into<String>,
    {
        Command::build(scope.into(), description.into(), CommandKind::Leaf(action))
    }

    /// Build a leaf command from a closure returning a boxed future. The
    /// closure receives its own copy of the execution context.
    pub fn from_fn<S, D, F>(scope: S, description: D, f: F) -> Self
    where
        S: Into<String>,
        D: Into<String>,
        F: Fn(CommandContext) -> futures::future::BoxFuture<'static, Result<(), AppError>>
            + Send
            + Sync
            + 'static,
    {
        Command::new(scope, description, Arc::new(FnAction(f)))
    }

    fn build(scope: String, description: String, kind: CommandKind) -> Self {
        Command {
            inner: Arc::new(Inner {
                description,
                scope,
                print_description: AtomicBool::new(false),
                started: AtomicBool::new(false),
                sinks: Mutex::new(Vec::new()),
                transformers: Mutex::new(vec![Arc::new(unwrap_completion_layer)]),
                cleanup: Mutex::new(None),
                kind,
            }),
        }
    }

    /// Compose `self AND other`: run `self`; on failure return its result
    /// without running `other`, otherwise run `other` and return its result
    /// re-tagged as the composite's.
    pub fn and<S: Into<String>>(&self, scope: S, other: Command) -> Command {
        Command::composite(scope.into(), CompositeOperator::And, self.clone(), other)
    }

    /// Compose `self OR other`: run `self`; on success return its result
    /// untouched, otherwise run `other` and return its result.
    pub fn or<S: Into<String>>(&self, scope: S, other: Command) -> Command {
        Command::composite(scope.into(), CompositeOperator::Or, self.clone(), other)
    }

    fn composite(scope: String, operator: CompositeOperator, left: Command, right: Command) -> Command {
        let description = format!(
            "({} {} {})",
            left.inner.description, operator, right.inner.description
        );
        Command::build(scope, description, CommandKind::Composite { operator, left, right })
    }

    pub fn description(&self) -> &str {
        &self.inner.description
    }

    pub fn scope(&self) -> &str {
        &self.inner.scope
    }

    pub fn is_running(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// Register an output sink. Composites forward the registration to both
    /// children so leaf process output reaches the same sinks.
    pub fn add_output_sink(&self, sink: Arc<dyn OutputSink>) {
        self.inner
            .sinks
            .lock()
            .expect("sink registry poisoned")
            .push(Arc::clone(&sink));
        if let CommandKind::Composite { left, right, .. } = &self.inner.kind {
            left.add_output_sink(Arc::clone(&sink));
            right.add_output_sink(sink);
        }
    }

    /// Toggle echoing the description to the sinks when execution starts.
    /// Forwarded to both children of a composite.
    pub fn set_print_description(&self, on: bool) {
        self.inner.print_description.store(on, Ordering::SeqCst);
        if let CommandKind::Composite { left, right, .. } = &self.inner.kind {
            left.set_print_description(on);
            right.set_print_description(on);
        }
    }

    /// Append a fault transformer. Runs after the default completion-unwrap,
    /// in registration order.
    pub fn add_fault_transformer(&self, transformer: Arc<FaultTransformer>) {
        self.inner
            .transformers
            .lock()
            .expect("transformer chain poisoned")
            .push(transformer);
    }

    /// Install a hook that runs after every execution, success or failure.
    pub fn set_cleanup<F: Fn() + Send + Sync + 'static>(&self, cleanup: F) {
        *self.inner.cleanup.lock().expect("cleanup hook poisoned") = Some(Box::new(cleanup));
    }

    /// Start the command on the worker pool.
    ///
    /// Fails synchronously with [`AlreadyRunning`] when an execution is in
    /// flight. The running flag is cleared and the cleanup hook fires when the
    /// execution resolves, even if the body panics.
    pub fn execute(&self) -> Result<CommandHandle, AlreadyRunning> {
        self.try_start()?;
        let command = self.clone();
        let join = tokio::spawn(async move { command.run_to_result().await });
        Ok(CommandHandle { command: self.clone(), join })
    }

    fn try_start(&self) -> Result<(), AlreadyRunning> {
        if self
            .inner
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AlreadyRunning { description: self.inner.description.clone() });
        }
        Ok(())
    }

    /// Run with the started flag already held; always releases it and fires
    /// the cleanup hook via the drop guard.
    async fn run_to_result(self) -> CommandResult {
        let _finish = FinishGuard(&self);
        match self.run_body().await {
            Ok(result) => result,
            Err(fault) => self.failure_from(fault),
        }
    }

    /// Run as a nested operand of a composite: same guard and normalization,
    /// resolved inline on the caller's task. Left always resolves before
    /// right is considered. Boxed because composites nest arbitrarily.
    fn run_inline(&self) -> futures::future::BoxFuture<'_, Result<CommandResult, AppError>> {
        async move {
            self.try_start()
                .map_err(|e| AppError::new(ErrorCategory::CommandError, e.to_string()))?;
            Ok(self.clone().run_to_result().await)
        }
        .boxed()
    }

    async fn run_body(&self) -> Result<CommandResult, AppError> {
        if self.inner.print_description.load(Ordering::SeqCst) {
            self.emit(StreamKind::Stdout, &self.inner.description);
        }
        match &self.inner.kind {
            CommandKind::Leaf(action) => {
                let ctx = self.context();
                action.run(&ctx).await?;
                Ok(CommandResult::success(&self.inner.description, &self.inner.scope))
            }
            CommandKind::Composite { operator: CompositeOperator::And, left, right } => {
                let first = left.run_inline().await?;
                if first.failed() {
                    return Ok(first);
                }
                let second = right.run_inline().await?;
                Ok(second.retagged(&self.inner.description, &self.inner.scope))
            }
            CommandKind::Composite { operator: CompositeOperator::Or, left, right } => {
                let first = left.run_inline().await?;
                if !first.failed() {
                    return Ok(first);
                }
                right.run_inline().await
            }
        }
    }

    fn failure_from(&self, fault: AppError) -> CommandResult {
        let fault = self.apply_transformers(fault);
        CommandResult::from_fault(&self.inner.description, &self.inner.scope, fault)
    }

    fn apply_transformers(&self, mut fault: AppError) -> AppError {
        let transformers: Vec<Arc<FaultTransformer>> = self
            .inner
            .transformers
            .lock()
            .expect("transformer chain poisoned")
            .clone();
        for transformer in transformers {
            fault = transformer(fault);
        }
        fault
    }

    fn emit(&self, kind: StreamKind, line: &str) {
        for sink in self.inner.sinks.lock().expect("sink registry poisoned").iter() {
            sink.line(kind, line);
        }
    }

    fn context(&self) -> CommandContext {
        CommandContext {
            description: self.inner.description.clone(),
            scope: self.inner.scope.clone(),
            sinks: self.inner.sinks.lock().expect("sink registry poisoned").clone(),
        }
    }

    fn finish(&self) {
        self.inner.started.store(false, Ordering::SeqCst);
        if let Some(cleanup) = self.inner.cleanup.lock().expect("cleanup hook poisoned").as_ref() {
            cleanup();
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("description", &self.inner.description)
            .field("scope", &self.inner.scope)
            .field("running", &self.is_running())
            .finish()
    }
}

struct FinishGuard<'a>(&'a Command);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Future-like handle to one command execution.
pub struct CommandHandle {
    command: Command,
    join: JoinHandle<CommandResult>,
}

impl CommandHandle {
    /// Suspend until the execution resolves. A join-level fault (panicked
    /// body) is normalized through the same pipeline as any other fault.
    pub async fn result(self) -> CommandResult {
        match self.join.await {
            Ok(result) => result,
            Err(join_error) => self.command.failure_from(AppError::completion(join_error)),
        }
    }
}

/// Default fault transformer: unwrap one completion-wrapper layer to recover
/// the original cause. Anything else passes through untouched.
pub(crate) fn unwrap_completion_layer(fault: AppError) -> AppError {
    if fault.category != ErrorCategory::CompletionError {
        return fault;
    }
    let AppError { category, severity, code, message, occurred_at, source } = fault;
    match source {
        Some(source) => match source.downcast::<AppError>() {
            Ok(inner) => inner,
            Err(source) => AppError { category, severity, code, message, occurred_at, source: Some(source) },
        },
        None => AppError { category, severity, code, message, occurred_at, source: None },
    }
}
