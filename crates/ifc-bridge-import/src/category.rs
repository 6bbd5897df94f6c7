// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host categories for IFC classes

use crate::options::ImportOptions;
use ifc_bridge_model::IfcType;

/// Category for anything without a more specific mapping
pub const GENERIC_MODELS: &str = "Generic Models";

fn builtin(ty: &IfcType) -> Option<&'static str> {
    use IfcType::*;
    Some(match ty {
        IfcWall | IfcCurtainWall => "Walls",
        IfcSlab => "Floors",
        IfcBeam | IfcMember => "Structural Framing",
        IfcColumn => "Columns",
        IfcFooting | IfcPile => "Structural Foundations",
        IfcDoor => "Doors",
        IfcWindow => "Windows",
        IfcStair | IfcStairFlight => "Stairs",
        IfcRamp | IfcRampFlight => "Ramps",
        IfcRailing => "Railings",
        IfcRoof => "Roofs",
        IfcCovering => "Ceilings",
        IfcPlate => "Plates",
        IfcSpace => "Rooms",
        IfcBuildingStorey => "Levels",
        IfcSite => "Site",
        IfcFurnishingElement => "Furniture",
        IfcFlowTerminal => "Plumbing Fixtures",
        IfcFlowSegment => "Pipes",
        IfcFlowFitting => "Pipe Fittings",
        IfcOpeningElement => "Openings",
        _ => return None,
    })
}

/// Category for a class, walking up the supertype chain
///
/// Overrides in the options are matched by class name first, at every
/// level of the chain.
pub fn category_for(ty: &IfcType, options: &ImportOptions) -> String {
    let mut current = Some(ty.clone());
    while let Some(ty) = current {
        if let Some(category) = options.category_overrides.get(ty.class_name()) {
            return category.clone();
        }
        if let Some(category) = builtin(&ty) {
            return category.to_string();
        }
        current = ty.supertype();
    }
    GENERIC_MODELS.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supertype_chain_lookup() {
        let options = ImportOptions::default();
        assert_eq!(category_for(&IfcType::IfcWallStandardCase, &options), "Walls");
        assert_eq!(category_for(&IfcType::IfcFurniture, &options), "Furniture");
        assert_eq!(category_for(&IfcType::IfcBuildingElementProxy, &options), GENERIC_MODELS);
        assert_eq!(category_for(&IfcType::Unknown("IFCFOO".into()), &options), GENERIC_MODELS);
    }

    #[test]
    fn test_overrides_win() {
        let options = ImportOptions::default().with_category_override("IfcWall", "Curtain Panels");
        assert_eq!(category_for(&IfcType::IfcWallStandardCase, &options), "Curtain Panels");
    }
}
