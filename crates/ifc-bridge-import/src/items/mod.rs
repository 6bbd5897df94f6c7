// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Representation item router
//!
//! Each handled item type builds a [`GeometrySet`] in the item's own
//! coordinate system. Placement into the world happens later, when an
//! element's shape is assembled.

mod brep;
mod csg;
mod mapped;
mod surface_model;
mod swept;
mod tessellated;

use crate::entity::representation::read_bounding_box;
use crate::error::{ImportError, Result};
use crate::session::ImportSession;
use ifc_bridge_geometry::{csg as primitives, CurveGeometry, Matrix4, Solid, Vector3};
use ifc_bridge_model::{DecodedEntity, IfcType};

pub use brep::face_set_warning;

/// Geometry produced by one or more representation items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometrySet {
    pub solids: Vec<Solid>,
    /// Solids to subtract from `solids`
    pub voids: Vec<Solid>,
    pub curves: Vec<CurveGeometry>,
}

impl GeometrySet {
    pub fn from_solid(solid: Solid) -> Self {
        Self {
            solids: vec![solid],
            ..Self::default()
        }
    }

    pub fn from_curve(curve: CurveGeometry) -> Self {
        Self {
            curves: vec![curve],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.solids.is_empty() && self.voids.is_empty() && self.curves.is_empty()
    }

    pub fn extend(&mut self, other: GeometrySet) {
        self.solids.extend(other.solids);
        self.voids.extend(other.voids);
        self.curves.extend(other.curves);
    }

    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        Self {
            solids: self.solids.iter().map(|s| s.transformed(m)).collect(),
            voids: self.voids.iter().map(|s| s.transformed(m)).collect(),
            curves: self.curves.iter().map(|c| c.transformed(m)).collect(),
        }
    }
}

/// Whether `ty` is a representation item this importer builds
///
/// Curves are routed separately, see [`crate::entity::EntityKind::classify`].
pub fn is_handled(ty: &IfcType) -> bool {
    use IfcType::*;
    matches!(
        ty,
        IfcExtrudedAreaSolid
            | IfcRevolvedAreaSolid
            | IfcSurfaceCurveSweptAreaSolid
            | IfcSweptDiskSolid
            | IfcFacetedBrep
            | IfcFacetedBrepWithVoids
            | IfcAdvancedBrep
            | IfcBooleanResult
            | IfcBooleanClippingResult
            | IfcCsgSolid
            | IfcBlock
            | IfcRightCircularCylinder
            | IfcRightCircularCone
            | IfcSphere
            | IfcRectangularPyramid
            | IfcShellBasedSurfaceModel
            | IfcFaceBasedSurfaceModel
            | IfcTriangulatedFaceSet
            | IfcMappedItem
            | IfcBoundingBox
    )
}

pub(crate) fn build(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    use IfcType::*;
    match record.ifc_type {
        IfcExtrudedAreaSolid => swept::extruded(session, record),
        IfcRevolvedAreaSolid => swept::revolved(session, record),
        IfcSurfaceCurveSweptAreaSolid => swept::surface_curve(session, record),
        IfcSweptDiskSolid => swept::disk(session, record),
        IfcFacetedBrep | IfcFacetedBrepWithVoids | IfcAdvancedBrep => brep::build(session, record),
        IfcBooleanResult | IfcBooleanClippingResult => csg::boolean(session, record),
        IfcCsgSolid => csg::csg_solid(session, record),
        IfcBlock | IfcRightCircularCylinder | IfcRightCircularCone | IfcSphere
        | IfcRectangularPyramid => csg::primitive(session, record),
        IfcShellBasedSurfaceModel | IfcFaceBasedSurfaceModel => surface_model::build(session, record),
        IfcTriangulatedFaceSet => tessellated::build(session, record),
        IfcMappedItem => mapped::build(session, record),
        IfcBoundingBox => {
            let bbox = read_bounding_box(session, record)?;
            let solid = primitives::block(bbox.size.x, bbox.size.y, bbox.size.z)?;
            let at = Matrix4::new_translation(&Vector3::new(bbox.corner.x, bbox.corner.y, bbox.corner.z));
            Ok(GeometrySet::from_solid(solid.transformed(&at)))
        }
        _ => Err(ImportError::UnhandledSubtype {
            entity: record.id,
            ifc_type: record.ifc_type.class_name().to_string(),
            expected: "representation item",
        }),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use ifc_bridge_parser::StepStore;

    /// Store with an empty unit assignment followed by `data`
    pub fn store(data: &str) -> StepStore {
        StepStore::parse(format!(
            "ISO-10303-21;\nHEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;\nDATA;\n#1=IFCUNITASSIGNMENT(());\n{data}\nENDSEC;\nEND-ISO-10303-21;\n"
        ))
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::store;
    use super::*;
    use crate::options::ImportOptions;
    use approx::assert_relative_eq;
    use ifc_bridge_model::EntityId;

    #[test]
    fn test_bounding_box_item_is_a_block_at_its_corner() {
        let store = store(
            "#2=IFCCARTESIANPOINT((1.,2.,3.));
#3=IFCBOUNDINGBOX(#2,2.,2.,2.);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(3))).unwrap();
        let (min, max) = set.solids[0].to_mesh(24, 1e-9).unwrap().bounds().unwrap();
        assert_relative_eq!(min.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(max.z, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_transformed_moves_voids_and_curves() {
        let mut set = GeometrySet::from_solid(primitives::block(1.0, 1.0, 1.0).unwrap());
        set.voids.push(primitives::block(0.5, 0.5, 0.5).unwrap());
        let moved = set.transformed(&Matrix4::new_translation(&Vector3::new(0.0, 0.0, 10.0)));
        let (min, _) = moved.voids[0].to_mesh(24, 1e-9).unwrap().bounds().unwrap();
        assert_relative_eq!(min.z, 10.0, epsilon = 1e-6);
        assert!(!moved.is_empty());
    }
}
