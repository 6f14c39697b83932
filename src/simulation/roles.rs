// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Deciding which of a charger's batteries it charges from and which it
//! charges into.
//!
//! Precedence is an explicit role tag, then the component's name, then the
//! order of the ids.  The same candidates always resolve the same way, so a
//! charger can't flip between two batteries from one tick to the next.

use crate::{BatteryRole, ComponentType, Node};

const STARTER_KEYWORDS: [&str; 4] = ["starter", "start", "engine", "crank"];
const HOUSE_KEYWORDS: [&str; 5] = ["house", "lithium", "aux", "lifepo", "service"];

/// A battery traced from a charger.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BatteryCandidate<'a> {
    pub id: u64,
    pub name: &'a str,
    pub role: Option<BatteryRole>,
}

impl<'a> BatteryCandidate<'a> {
    pub(crate) fn from_node<N: Node>(node: &'a N) -> Self {
        Self {
            id: node.component_id(),
            name: node.name(),
            role: explicit_role(node),
        }
    }

    /// The role guessed from the battery's name.  A name that matches both
    /// sets of keywords, like "engine house", guesses nothing.
    fn guessed_role(&self) -> Option<BatteryRole> {
        let name = self.name.to_lowercase();
        let starter = STARTER_KEYWORDS.iter().any(|k| name.contains(k));
        let house = HOUSE_KEYWORDS.iter().any(|k| name.contains(k));
        match (starter, house) {
            (true, false) => Some(BatteryRole::Starter),
            (false, true) => Some(BatteryRole::House),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BatteryRoles {
    /// The battery the charger draws from, on the alternator side.
    pub source: Option<u64>,
    /// The battery the charger charges.
    pub target: Option<u64>,
}

/// Returns the role tagged on a battery, or implied by its type.
fn explicit_role<N: Node>(node: &N) -> Option<BatteryRole> {
    node.parameters().role.or(match node.component_type() {
        ComponentType::StarterBattery => Some(BatteryRole::Starter),
        ComponentType::HouseBattery => Some(BatteryRole::House),
        _ => None,
    })
}

/// Returns the role of a battery, by tag or by name.
pub(crate) fn battery_role<N: Node>(node: &N) -> Option<BatteryRole> {
    let candidate = BatteryCandidate::from_node(node);
    candidate.role.or_else(|| candidate.guessed_role())
}

pub(crate) fn resolve_battery_roles(candidates: &[BatteryCandidate]) -> BatteryRoles {
    let mut sorted = candidates.iter().collect::<Vec<_>>();
    sorted.sort_by_key(|c| c.id);
    sorted.dedup_by_key(|c| c.id);

    match sorted.as_slice() {
        [] => BatteryRoles::default(),
        [only] => BatteryRoles {
            source: None,
            target: Some(only.id),
        },
        _ => {
            let mut source = find_role(&sorted, BatteryRole::Starter, None);
            let mut target = find_role(&sorted, BatteryRole::House, source);

            // Whatever is still missing comes from id order, the lowest id
            // being the source.
            if source.is_none() {
                source = sorted.iter().map(|c| c.id).find(|id| Some(*id) != target);
            }
            if target.is_none() {
                target = sorted.iter().map(|c| c.id).find(|id| Some(*id) != source);
            }

            BatteryRoles { source, target }
        }
    }
}

/// Returns the first candidate other than `except` that is tagged with the
/// given role, or else the first untagged one whose name suggests it.
fn find_role(
    sorted: &[&BatteryCandidate],
    role: BatteryRole,
    except: Option<u64>,
) -> Option<u64> {
    let eligible = || sorted.iter().filter(move |c| Some(c.id) != except);
    eligible()
        .find(|c| c.role == Some(role))
        .or_else(|| eligible().find(|c| c.role.is_none() && c.guessed_role() == Some(role)))
        .map(|c| c.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, ComponentSpec};

    fn candidate(id: u64, name: &str) -> BatteryCandidate<'_> {
        BatteryCandidate {
            id,
            name,
            role: None,
        }
    }

    fn roles(source: u64, target: u64) -> BatteryRoles {
        BatteryRoles {
            source: Some(source),
            target: Some(target),
        }
    }

    #[test]
    fn test_no_or_one_battery() {
        assert_eq!(resolve_battery_roles(&[]), BatteryRoles::default());
        assert_eq!(
            resolve_battery_roles(&[candidate(4, "Starter")]),
            BatteryRoles {
                source: None,
                target: Some(4)
            }
        );
    }

    #[test]
    fn test_explicit_roles_win() {
        let candidates = [
            BatteryCandidate {
                role: Some(BatteryRole::House),
                ..candidate(1, "Engine")
            },
            BatteryCandidate {
                role: Some(BatteryRole::Starter),
                ..candidate(2, "House")
            },
        ];
        assert_eq!(resolve_battery_roles(&candidates), roles(2, 1));
    }

    #[test]
    fn test_name_heuristics() {
        assert_eq!(
            resolve_battery_roles(&[candidate(1, "House bank"), candidate(2, "Engine start")]),
            roles(2, 1)
        );
        assert_eq!(
            resolve_battery_roles(&[candidate(1, "LiFePO4 100Ah"), candidate(2, "Cranking")]),
            roles(2, 1)
        );

        // Only one side is recognizable, the other one takes what's left.
        assert_eq!(
            resolve_battery_roles(&[candidate(1, "Battery"), candidate(2, "Aux")]),
            roles(1, 2)
        );
        assert_eq!(
            resolve_battery_roles(&[candidate(1, "Battery"), candidate(2, "Starter")]),
            roles(2, 1)
        );
    }

    #[test]
    fn test_ambiguous_names_fall_back_to_id_order() {
        let first = [candidate(7, "Battery A"), candidate(3, "Battery B")];
        let second = [candidate(3, "Battery B"), candidate(7, "Battery A")];
        assert_eq!(resolve_battery_roles(&first), roles(3, 7));
        assert_eq!(resolve_battery_roles(&second), roles(3, 7));

        // Both keyword sets match, so neither guess is used.
        assert_eq!(
            resolve_battery_roles(&[candidate(9, "Engine house"), candidate(5, "Bank")]),
            roles(5, 9)
        );
    }

    #[test]
    fn test_role_of_components() {
        let starter = Component::new(1, ComponentType::StarterBattery, "Bank 1");
        let house = Component::new(2, ComponentType::HouseBattery, "Bank 2");
        let guessed = Component::new(3, ComponentType::Battery, "Engine battery");
        let tagged = Component::new(4, ComponentType::Battery, "Engine battery").with_overrides(
            ComponentSpec {
                role: Some(BatteryRole::House),
                ..Default::default()
            },
        );
        let unknown = Component::new(5, ComponentType::Battery, "Battery");

        assert_eq!(battery_role(&starter), Some(BatteryRole::Starter));
        assert_eq!(battery_role(&house), Some(BatteryRole::House));
        assert_eq!(battery_role(&guessed), Some(BatteryRole::Starter));
        assert_eq!(battery_role(&tagged), Some(BatteryRole::House));
        assert_eq!(battery_role(&unknown), None);
    }
}
