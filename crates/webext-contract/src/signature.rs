//! Method signatures built from function-like nodes.

use crate::infer::{ExpressionTyper, ThisScope};
use crate::jsdoc::ParsedJsDoc;
use crate::model::MethodSignature;
use crate::session::FileContext;
use crate::shape::FunctionLike;
use crate::types::{type_parameter_names, TypeRenderer};

/// Builds method signatures from function-like nodes.
///
/// For every element JSDoc beats the structural annotation. A missing return
/// type is inferred from the body.
#[derive(Clone, Copy)]
pub(crate) struct SignatureBuilder<'c, 'a> {
    ctx: FileContext<'c, 'a>,
}

impl<'c, 'a> SignatureBuilder<'c, 'a> {
    pub fn new(ctx: FileContext<'c, 'a>) -> Self {
        Self { ctx }
    }

    pub fn build(
        &self,
        function: FunctionLike<'c, 'a>,
        docs: Option<&ParsedJsDoc>,
        this_scope: &ThisScope,
    ) -> MethodSignature {
        let renderer = TypeRenderer::new(self.ctx);

        let type_parameters = match docs {
            Some(docs) if !docs.templates.is_empty() => docs.templates.clone(),
            _ => type_parameter_names(function.type_parameters()),
        };
        let parameters = renderer.parameters(function.params(), docs);
        let return_type = docs
            .and_then(|docs| docs.returns.clone())
            .or_else(|| {
                function
                    .return_type()
                    .map(|annotation| renderer.render_annotation(annotation))
            })
            .unwrap_or_else(|| {
                ExpressionTyper::new(self.ctx).infer_return_type(function, this_scope)
            });

        MethodSignature {
            type_parameters,
            parameters,
            return_type,
        }
    }
}
