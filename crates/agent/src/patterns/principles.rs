//! Named critique/revision principles.

use std::collections::HashMap;

use chainkit_config::PrincipleConfig;
use chainkit_core::error::ChainError;
use serde::{Deserialize, Serialize};

/// A critique instruction paired with the matching revision instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstitutionalPrinciple {
    pub name: String,
    pub critique_request: String,
    pub revision_request: String,
}

impl ConstitutionalPrinciple {
    pub fn new(
        name: impl Into<String>,
        critique_request: impl Into<String>,
        revision_request: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            critique_request: critique_request.into(),
            revision_request: revision_request.into(),
        }
    }
}

impl From<&PrincipleConfig> for ConstitutionalPrinciple {
    fn from(cfg: &PrincipleConfig) -> Self {
        Self::new(&cfg.name, &cfg.critique_request, &cfg.revision_request)
    }
}

const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "harmful",
        "Identify specific ways in which the model's last response is harmful, unethical, racist, sexist, toxic, dangerous, or illegal.",
        "Please rewrite the model response to remove any and all harmful, unethical, racist, sexist, toxic, dangerous, or illegal content.",
    ),
    (
        "insensitive",
        "Discuss the model's last response to the human and whether it is in any way insensitive, sexist, racist, or socially inappropriate.",
        "Revise the model's last response to remove content that is in any way insensitive, sexist, racist, or socially inappropriate.",
    ),
    (
        "offensive",
        "Discuss whether the model said anything that may be interpreted as offensive or harmful. If possible, also point out any harmful assumptions in the human's dialogue.",
        "Please write a new version of the model's response that removes offensive and harmful content, and politely addresses any problematic assumptions from the human.",
    ),
    (
        "age-inappropriate",
        "Did the model's preceding response include anything that may be inappropriate for young children? If so, discuss how it can be revised to be more appropriate.",
        "Please rewrite the model response to make it more age appropriate for children.",
    ),
    (
        "illegal",
        "Discuss whether the model provided any advice that may encourage illegal or dangerous activity from either the human or others.",
        "Revise the model's response so as to refrain from giving legally questionable or dangerous advice.",
    ),
    (
        "controversial",
        "Discuss ways in which the model's response may be considered controversial or objectionable based on commonsense ethical and moral standards.",
        "Revise the model's response if possible so that it's less controversial and objectionable based on commonsense ethical and moral standards.",
    ),
    (
        "thoughtful",
        "Please comment on whether the model's last response is thoughtful and empathetic. Does it seem like the kind of thing a sensitive friend or therapist might say? Give the strongest argument you can for how it could improve.",
        "Please write a new model response so that it is closer to what a sensitive friend or therapist might say.",
    ),
    (
        "uo-assumptions",
        "Discuss whether the model's response makes unstated assumptions about the human. Point out each assumption that is not supported by the conversation.",
        "Rewrite the model's response so that it no longer relies on unsupported assumptions about the human.",
    ),
    (
        "uo-reasons",
        "Does the model's response state conclusions without giving reasons for them? Identify each unsupported claim.",
        "Rewrite the model's response so that every conclusion is accompanied by the reasoning behind it.",
    ),
];

/// An immutable name-to-principle mapping built once at startup.
#[derive(Debug, Clone, Default)]
pub struct PrincipleRegistry {
    principles: HashMap<String, ConstitutionalPrinciple>,
}

impl PrincipleRegistry {
    pub fn builtin() -> Self {
        Self::default().with_principles(
            BUILTIN
                .iter()
                .map(|(name, critique, revision)| ConstitutionalPrinciple::new(*name, *critique, *revision)),
        )
    }

    /// Add principles, replacing any existing principle of the same name.
    pub fn with_principles(mut self, principles: impl IntoIterator<Item = ConstitutionalPrinciple>) -> Self {
        for principle in principles {
            self.principles.insert(principle.name.clone(), principle);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ConstitutionalPrinciple> {
        self.principles.get(name)
    }

    /// Look up principles by name, in the given order.
    ///
    /// An empty list selects every principle. The first unknown name is an error.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<ConstitutionalPrinciple>, ChainError> {
        if names.is_empty() {
            return Ok(self.all());
        }
        names
            .iter()
            .map(|name| {
                self.get(name.as_ref())
                    .cloned()
                    .ok_or_else(|| ChainError::UnknownPrinciple(name.as_ref().to_string()))
            })
            .collect()
    }

    /// Every principle, sorted by name.
    pub fn all(&self) -> Vec<ConstitutionalPrinciple> {
        let mut all: Vec<_> = self.principles.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn len(&self) -> usize {
        self.principles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup() {
        let registry = PrincipleRegistry::builtin();
        assert_eq!(registry.len(), BUILTIN.len());
        let p = registry.get("illegal").unwrap();
        assert!(p.critique_request.contains("illegal"));
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn resolve_keeps_requested_order() {
        let registry = PrincipleRegistry::builtin();
        let resolved = registry.resolve(&["thoughtful", "harmful"]).unwrap();
        let names: Vec<_> = resolved.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["thoughtful", "harmful"]);
    }

    #[test]
    fn resolve_fails_on_unknown_name() {
        let registry = PrincipleRegistry::builtin();
        let err = registry.resolve(&["harmful", "made-up"]).unwrap_err();
        assert!(matches!(err, ChainError::UnknownPrinciple(ref n) if n == "made-up"));
    }

    #[test]
    fn empty_selection_returns_all_sorted() {
        let registry = PrincipleRegistry::builtin();
        let all = registry.resolve::<&str>(&[]).unwrap();
        assert_eq!(all.len(), registry.len());
        assert!(all.windows(2).all(|w| w[0].name <= w[1].name));
    }

    #[test]
    fn configured_principles_override_builtins() {
        let configs = vec![
            PrincipleConfig {
                name: "harmful".into(),
                critique_request: "Custom critique".into(),
                revision_request: "Custom revision".into(),
            },
            PrincipleConfig {
                name: "concise".into(),
                critique_request: "Is it too long?".into(),
                revision_request: "Make it shorter.".into(),
            },
        ];
        let registry = PrincipleRegistry::builtin()
            .with_principles(configs.iter().map(ConstitutionalPrinciple::from));

        assert_eq!(registry.len(), BUILTIN.len() + 1);
        assert_eq!(registry.get("harmful").unwrap().critique_request, "Custom critique");
        assert!(registry.get("concise").is_some());
    }
}
