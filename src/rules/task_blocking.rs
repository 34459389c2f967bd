//! FAINF0001: synchronous waits on tasks.

use super::{
    AnalysisContext, Analyzer, Finding, RuleCategory, RuleDescriptor, RuleSession, RuleSeverity,
};
use crate::semantic::{SymbolResolver, Ty, TypeId, TypeLookup};
use crate::syntax::visit::each_expr;
use crate::syntax::{Expr, ExprKind};

pub static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: "FAINF0001",
    name: "Blocking task call",
    category: RuleCategory::Reliability,
    severity: RuleSeverity::Warning,
    description: "Task.Wait() and Task<T>.Result block the calling thread until the task \
                  completes, which wastes a thread-pool thread and can deadlock under a \
                  synchronization context.",
    fix_template: Some("await task;"),
};

const TASKS_NAMESPACE: &str = "System.Threading.Tasks";

pub struct TaskBlockingAnalyzer;

impl Analyzer for TaskBlockingAnalyzer {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    fn start(&self, types: &dyn TypeLookup) -> Option<Box<dyn RuleSession>> {
        let declared = |name: &str| types.type_by_metadata_name(&format!("{TASKS_NAMESPACE}.{name}"));
        Some(Box::new(TaskBlockingSession {
            task: declared("Task"),
            generic_task: declared("Task`1"),
            value_task: declared("ValueTask`1"),
        }))
    }
}

/// Task types declared in source, for projects that stub them.
struct TaskBlockingSession {
    task: Option<TypeId>,
    generic_task: Option<TypeId>,
    value_task: Option<TypeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskShape {
    /// `Task`
    Plain,
    /// `Task<T>`
    Generic,
    /// `ValueTask<T>`
    Value,
}

impl TaskBlockingSession {
    fn shape(&self, ty: &Ty) -> Option<TaskShape> {
        match ty {
            Ty::Named { def, .. } => {
                let def = Some(*def);
                if def == self.task {
                    Some(TaskShape::Plain)
                } else if def == self.generic_task {
                    Some(TaskShape::Generic)
                } else if def == self.value_task {
                    Some(TaskShape::Value)
                } else {
                    None
                }
            }
            Ty::External { name, args } => {
                let simple = match name.rsplit_once('.') {
                    Some((namespace, simple)) if namespace == TASKS_NAMESPACE => simple,
                    Some(_) => return None,
                    None => name.as_str(),
                };
                match (simple, args.len()) {
                    ("Task", 0) => Some(TaskShape::Plain),
                    ("Task", 1) => Some(TaskShape::Generic),
                    ("ValueTask", 1) => Some(TaskShape::Value),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn check(&self, expr: &Expr, resolver: &dyn SymbolResolver) -> Option<Finding> {
        let (access, member) = match &expr.kind {
            ExprKind::Invocation { callee, .. } => match &callee.kind {
                ExprKind::MemberAccess { name, .. } if name.name() == "Wait" => {
                    (callee.as_ref(), "Wait")
                }
                _ => return None,
            },
            ExprKind::MemberAccess { name, .. } if name.name() == "Result" => (expr, "Result"),
            _ => return None,
        };
        let ExprKind::MemberAccess { target, .. } = &access.kind else {
            return None;
        };

        let shape = self.shape(&resolver.type_of(target)?)?;
        let blocks = match member {
            "Wait" => matches!(shape, TaskShape::Plain | TaskShape::Generic),
            _ => matches!(shape, TaskShape::Generic | TaskShape::Value),
        };
        blocks.then(|| {
            Finding::new(
                access.span,
                format!("{member} blocks until the task completes; await it instead"),
            )
        })
    }
}

impl RuleSession for TaskBlockingSession {
    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        each_expr(ctx.unit, |expr| {
            if let Some(finding) = self.check(expr, ctx.resolver) {
                findings.push(finding);
            }
        });
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{Compilation, SemanticModel};
    use crate::syntax::parse;
    use std::path::Path;

    fn findings(source: &str) -> Vec<String> {
        let unit = parse(source).unwrap().unit;
        let compilation = Compilation::new([&unit]);
        let model = SemanticModel::new(&compilation, &unit);
        let session = TaskBlockingAnalyzer.start(&compilation).unwrap();
        let ctx = AnalysisContext {
            path: Path::new("Example.cs"),
            source,
            unit: &unit,
            resolver: &model,
        };
        session
            .analyze(&ctx)
            .into_iter()
            .map(|f| f.span.text(source).to_string())
            .collect()
    }

    #[test]
    fn test_wait_and_result_are_reported() {
        let source = r#"
using System.Threading.Tasks;

public class Example
{
    void Run()
    {
        Task task1 = Task.CompletedTask;
        Task<int> task2 = Task.FromResult(42);
        task1.Wait();
        var result = task2.Result;
        task2.Wait();
    }
}
"#;
        assert_eq!(findings(source), vec!["task1.Wait", "task2.Result", "task2.Wait"]);
    }

    #[test]
    fn test_awaited_and_unrelated_members_are_fine() {
        let source = r#"
using System.Threading.Tasks;

public class Holder { public int Result { get; set; } public void Wait() { } }

public class Example
{
    async Task<int> Run(Holder holder, Task<int> pending)
    {
        holder.Wait();
        var fromHolder = holder.Result;
        return await pending;
    }
}
"#;
        assert!(findings(source).is_empty());
    }

    #[test]
    fn test_value_task_result_and_qualified_names() {
        let source = r#"
public class Example
{
    void Run(System.Threading.Tasks.ValueTask<string> value, Other.Task<int> other)
    {
        var a = value.Result;
        var b = other.Result;
    }
}
"#;
        assert_eq!(findings(source), vec!["value.Result"]);
    }
}
