// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the traits that need to be implemented by the types
//! that represent a node and an edge.

use crate::component::ComponentSpec;
use crate::component_category::{ComponentCategory, ComponentType};

/**
This trait needs to be implemented by the type that represents a node.

Read more about why this is necessary [here][crate#the-node-and-edge-traits].

<details>
<summary>Example implementation for a diagram editor's node type:</summary>

```ignore
impl marine_dc_sim::Node for editor::DiagramNode {
    fn component_id(&self) -> u64 {
        self.id
    }

    fn component_type(&self) -> marine_dc_sim::ComponentType {
        use marine_dc_sim::ComponentType as Ct;

        match self.kind.as_str() {
            "starter-battery" => Ct::StarterBattery,
            "house-battery" => Ct::HouseBattery,
            "solar-panel" => Ct::SolarPanel,
            "dc-dc-mppt-charger" => Ct::DcDcMpptCharger,
            "fuse" => Ct::Fuse,
            "bus-bar" => Ct::BusBar,
            "light" => Ct::Light,
            // ...
            other => {
                warn!("Unknown component kind {other}, treating it as a load.");
                Ct::GenericLoad
            }
        }
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn spec(&self) -> &marine_dc_sim::ComponentSpec {
        &self.spec
    }

    fn overrides(&self) -> &marine_dc_sim::ComponentSpec {
        &self.user_values
    }
}
```

</details>
*/
pub trait Node {
    /// Returns the component id of the component.
    fn component_id(&self) -> u64;
    /// Returns the type of the component.
    fn component_type(&self) -> ComponentType;
    /// Returns the user-facing label of the component.
    fn name(&self) -> &str;
    /// Returns the static specification of the component.
    fn spec(&self) -> &ComponentSpec;
    /// Returns the user-entered values that take precedence over the spec.
    fn overrides(&self) -> &ComponentSpec;

    /// Returns the category of the component, derived from its type.
    fn category(&self) -> ComponentCategory {
        self.component_type().category()
    }

    /// Returns the effective parameters of the component: every override
    /// that is set, and the spec value otherwise.
    fn parameters(&self) -> ComponentSpec {
        self.overrides().or(self.spec())
    }
}

/**
This trait needs to be implemented by the type that represents a wire.

Read more about why this is necessary [here][crate#the-node-and-edge-traits].

The direction of a wire is cosmetic, the simulation treats every wire as an
undirected connection between two components.

<details>
<summary>Example implementation for a diagram editor's wire type:</summary>

```ignore
impl marine_dc_sim::Edge for editor::DiagramWire {
    fn source(&self) -> u64 {
        self.from_node
    }

    fn destination(&self) -> u64 {
        self.to_node
    }
}
```

</details>
*/
pub trait Edge {
    /// Returns the component id at one end of the wire.
    fn source(&self) -> u64;
    /// Returns the component id at the other end of the wire.
    fn destination(&self) -> u64;
}
