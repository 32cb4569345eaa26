//! `keel explain`: replay a program one operation at a time and show what
//! each operation resolved to and the state it left behind.

use std::fmt::Write;

use keel_borrow::{
    resolve, CheckOptions, Rejection, Report, ResourceKind, ResourceState, Validator,
};
use keel_ops::Program;

pub struct Explanation {
    pub text: String,
    pub rejection: Option<Rejection>,
}

/// Step through `program`, writing one line per applied operation, the
/// rejection if there is one, and the final resource table.
pub fn explain(program: &Program, options: &CheckOptions) -> Explanation {
    let mut validator = Validator::new(options.clone());
    let mut text = String::new();
    let mut rejection = None;

    for (index, op) in program.ops.iter().enumerate() {
        let action = resolve(op.node.kind());
        match validator.step(index, &op.node, op.span) {
            Ok(()) => {
                let _ = writeln!(
                    text,
                    "{:>4}  {:<32} {:<18} depth {}  live {}  borrows {}",
                    index,
                    op.node.to_string(),
                    action.to_string(),
                    validator.scopes().depth(),
                    validator.table().live_count(),
                    validator.borrows().active_count(),
                );
            }
            Err(r) => {
                let _ = writeln!(text, "{:>4}  {:<32} {}", index, op.node.to_string(), r);
                rejection = Some(r);
                break;
            }
        }
    }

    match rejection {
        Some(_) => validator.abort(),
        None => {
            if let Err(r) = validator.finish(program.len()) {
                let _ = writeln!(text, "{:>4}  {:<32} {}", program.len(), "<end>", r);
                rejection = Some(r);
                validator.abort();
            }
        }
    }

    let _ = writeln!(text);
    let _ = writeln!(text, "resources:");
    for res in validator.table().iter() {
        let kind = match res.kind {
            ResourceKind::Unique => "unique".to_string(),
            ResourceKind::Shared(alloc) => format!("shared {}", alloc),
        };
        let _ = write!(
            text,
            "  {:<6} {:<12} owner {:<8} {:<8} {}",
            res.id.to_string(),
            res.name,
            validator.scopes().name(res.owner),
            state_name(res.state),
            kind,
        );
        if let Some(origin) = res.origin {
            let _ = write!(text, "  from {}", origin);
        }
        let _ = writeln!(text);
    }

    let verdict = match &rejection {
        None => "accepted".to_string(),
        Some(r) => format!("rejected: {}", r.reason),
    };
    let _ = writeln!(text);
    let _ = writeln!(text, "verdict: {}", verdict);

    Explanation { text, rejection }
}

/// The JSON form of an explanation is the report with its trace.
pub fn explain_report(program: &Program, options: &CheckOptions) -> Report {
    let options = CheckOptions {
        record_trace: true,
        ..options.clone()
    };
    Validator::new(options).validate(program)
}

fn state_name(state: ResourceState) -> &'static str {
    match state {
        ResourceState::Live => "live",
        ResourceState::Moved => "moved",
        ResourceState::Dropped => "dropped",
    }
}
