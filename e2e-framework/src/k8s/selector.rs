use std::collections::BTreeMap;

use kube::Resource;

use super::*;
use crate::errors::*;

// The meanings of these operators is explained here:
// https://kubernetes.io/docs/concepts/overview/working-with-objects/labels/#set-based-requirement
pub const OPERATOR_IN: &str = "In";
pub const OPERATOR_NOT_IN: &str = "NotIn";
pub const OPERATOR_EXISTS: &str = "Exists";
pub const OPERATOR_DOES_NOT_EXIST: &str = "DoesNotExist";

err_impl! {SelectorError,
    #[error("malformed label selector: {0:?}")]
    MalformedLabelSelector(metav1::LabelSelectorRequirement),
}

impl<T: Resource> KubeResourceExt for T {
    fn namespaced_name(&self) -> String {
        match self.meta().namespace.as_deref() {
            Some(ns) => super::namespaced_name(ns, self.meta().name.as_deref().unwrap_or_default()),
            None => self.meta().name.clone().unwrap_or_default(),
        }
    }

    fn matches(&self, sel: &metav1::LabelSelector) -> anyhow::Result<bool> {
        let empty = BTreeMap::new();
        let obj_labels = self.meta().labels.as_ref().unwrap_or(&empty);

        if let Some(exprs) = &sel.match_expressions {
            for expr in exprs {
                if !label_expr_match(obj_labels, expr)? {
                    return Ok(false);
                }
            }
        }

        if let Some(labels) = &sel.match_labels {
            for (k, v) in labels {
                if obj_labels.get(k) != Some(v) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

// Render a LabelSelector in the string syntax the apiserver accepts in the labelSelector query
// parameter, e.g. "app=foo,tier in (web,api),!canary"
pub fn label_selector_string(sel: &metav1::LabelSelector) -> anyhow::Result<String> {
    let mut terms = vec![];
    if let Some(labels) = &sel.match_labels {
        terms.extend(labels.iter().map(|(k, v)| format!("{k}={v}")));
    }

    if let Some(exprs) = &sel.match_expressions {
        for expr in exprs {
            validate_expr(expr)?;
            let values = expr.values.as_deref().unwrap_or_default().join(",");
            let term = match expr.operator.as_str() {
                OPERATOR_IN => format!("{} in ({values})", expr.key),
                OPERATOR_NOT_IN => format!("{} notin ({values})", expr.key),
                OPERATOR_EXISTS => expr.key.clone(),
                OPERATOR_DOES_NOT_EXIST => format!("!{}", expr.key),
                _ => unreachable!(),
            };
            terms.push(term);
        }
    }

    Ok(terms.join(","))
}

// LabelSelectorRequirement is considered invalid if the Operator is "In" or NotIn"
// and there are no values; conversely for "Exists" and "DoesNotExist".
fn validate_expr(expr: &metav1::LabelSelectorRequirement) -> EmptyResult {
    let has_values = expr.values.as_ref().is_some_and(|values| !values.is_empty());
    match expr.operator.as_str() {
        OPERATOR_IN | OPERATOR_NOT_IN if has_values => Ok(()),
        OPERATOR_EXISTS | OPERATOR_DOES_NOT_EXIST if !has_values => Ok(()),
        _ => Err(SelectorError::malformed_label_selector(expr)),
    }
}

fn label_expr_match(
    obj_labels: &BTreeMap<String, String>,
    expr: &metav1::LabelSelectorRequirement,
) -> anyhow::Result<bool> {
    validate_expr(expr)?;
    let values = expr.values.as_deref().unwrap_or_default();
    Ok(match expr.operator.as_str() {
        OPERATOR_IN => obj_labels.get(&expr.key).is_some_and(|v| values.contains(v)),
        OPERATOR_NOT_IN => obj_labels.get(&expr.key).is_none_or(|v| !values.contains(v)),
        OPERATOR_EXISTS => obj_labels.contains_key(&expr.key),
        OPERATOR_DOES_NOT_EXIST => !obj_labels.contains_key(&expr.key),
        _ => unreachable!(),
    })
}
