// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed entity graph
//!
//! Every processed record becomes one flat [`Entity`]: a [`EntityKind`] tag
//! plus the capability structs that kind carries. Construction reads the
//! supertype levels first (root fields, then definition, product, ...), each
//! level only touching the attributes it declares.

pub mod curve;
pub mod object;
pub mod placement;
pub mod profile;
pub mod representation;

use crate::cache::EntityHandle;
use crate::error::{Processed, Result};
use crate::items::{self, GeometrySet};
use crate::session::ImportSession;
use crate::sink::ElementHandle;
use crate::units::{self, Unit};
use ifc_bridge_geometry::{CurveGeometry, CurveLoop, Matrix4, Point3, Profile, Vector3};
use ifc_bridge_model::{DecodedEntity, EntityId, IfcType};
use uuid::Uuid;

/// What a cached entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Project,
    Site,
    Building,
    BuildingStorey,
    Space,
    Element,
    Opening,
    Group,
    TypeObject,
    Placement,
    Curve,
    Profile,
    ProductShape,
    Representation,
    RepresentationMap,
    Item,
    Unit,
    Material,
}

/// What a caller asks a reference to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityClass {
    ObjectDefinition,
    Placement,
    Curve,
    Profile,
    ProductShape,
    Representation,
    RepresentationMap,
    Item,
    Unit,
    Material,
}

impl EntityClass {
    pub fn name(self) -> &'static str {
        match self {
            EntityClass::ObjectDefinition => "object definition",
            EntityClass::Placement => "placement",
            EntityClass::Curve => "curve",
            EntityClass::Profile => "profile",
            EntityClass::ProductShape => "product shape",
            EntityClass::Representation => "representation",
            EntityClass::RepresentationMap => "representation map",
            EntityClass::Item => "representation item",
            EntityClass::Unit => "unit",
            EntityClass::Material => "material",
        }
    }
}

impl EntityKind {
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Site => "site",
            EntityKind::Building => "building",
            EntityKind::BuildingStorey => "building storey",
            EntityKind::Space => "space",
            EntityKind::Element => "element",
            EntityKind::Opening => "opening",
            EntityKind::Group => "group",
            EntityKind::TypeObject => "type object",
            EntityKind::Placement => "placement",
            EntityKind::Curve => "curve",
            EntityKind::Profile => "profile",
            EntityKind::ProductShape => "product shape",
            EntityKind::Representation => "representation",
            EntityKind::RepresentationMap => "representation map",
            EntityKind::Item => "representation item",
            EntityKind::Unit => "unit",
            EntityKind::Material => "material",
        }
    }

    pub fn is_object_definition(self) -> bool {
        matches!(
            self,
            EntityKind::Project
                | EntityKind::Site
                | EntityKind::Building
                | EntityKind::BuildingStorey
                | EntityKind::Space
                | EntityKind::Element
                | EntityKind::Opening
                | EntityKind::Group
                | EntityKind::TypeObject
        )
    }

    /// Objects with placement and representation
    pub fn is_product(self) -> bool {
        matches!(
            self,
            EntityKind::Site
                | EntityKind::Building
                | EntityKind::BuildingStorey
                | EntityKind::Space
                | EntityKind::Element
                | EntityKind::Opening
        )
    }

    pub fn is_spatial(self) -> bool {
        matches!(
            self,
            EntityKind::Site | EntityKind::Building | EntityKind::BuildingStorey | EntityKind::Space
        )
    }

    /// Whether an entity of this kind satisfies a request for `class`
    ///
    /// Curves double as representation items.
    pub fn is_a(self, class: EntityClass) -> bool {
        match class {
            EntityClass::ObjectDefinition => self.is_object_definition(),
            EntityClass::Placement => self == EntityKind::Placement,
            EntityClass::Curve => self == EntityKind::Curve,
            EntityClass::Profile => self == EntityKind::Profile,
            EntityClass::ProductShape => self == EntityKind::ProductShape,
            EntityClass::Representation => self == EntityKind::Representation,
            EntityClass::RepresentationMap => self == EntityKind::RepresentationMap,
            EntityClass::Item => matches!(self, EntityKind::Item | EntityKind::Curve),
            EntityClass::Unit => self == EntityKind::Unit,
            EntityClass::Material => self == EntityKind::Material,
        }
    }

    /// Choose the kind for a record requested as `class`
    ///
    /// `None` means the type is not one of the handled subtypes.
    pub fn classify(ty: &IfcType, class: EntityClass) -> Option<EntityKind> {
        use IfcType::*;
        let sub = |ancestor: IfcType| ty.is_subtype_of(&ancestor);
        match class {
            EntityClass::ObjectDefinition => Some(match ty {
                IfcProject => EntityKind::Project,
                IfcSite => EntityKind::Site,
                IfcBuilding => EntityKind::Building,
                IfcBuildingStorey => EntityKind::BuildingStorey,
                IfcSpace => EntityKind::Space,
                IfcOpeningElement => EntityKind::Opening,
                _ if sub(IfcElement) => EntityKind::Element,
                _ if sub(IfcGroup) => EntityKind::Group,
                _ if sub(IfcTypeProduct) => EntityKind::TypeObject,
                _ => return None,
            }),
            EntityClass::Placement => (sub(IfcPlacement)
                || sub(IfcLocalPlacement)
                || sub(IfcCartesianTransformationOperator))
            .then_some(EntityKind::Placement),
            EntityClass::Curve => is_handled_curve(ty).then_some(EntityKind::Curve),
            EntityClass::Profile => {
                (sub(IfcProfileDef) && *ty != IfcProfileDef && *ty != IfcParameterizedProfileDef)
                    .then_some(EntityKind::Profile)
            }
            EntityClass::ProductShape => sub(IfcProductRepresentation).then_some(EntityKind::ProductShape),
            EntityClass::Representation => sub(IfcRepresentation).then_some(EntityKind::Representation),
            EntityClass::RepresentationMap => {
                (*ty == IfcRepresentationMap).then_some(EntityKind::RepresentationMap)
            }
            EntityClass::Item => {
                if is_handled_curve(ty) {
                    Some(EntityKind::Curve)
                } else {
                    items::is_handled(ty).then_some(EntityKind::Item)
                }
            }
            EntityClass::Unit => (sub(IfcNamedUnit) || *ty == IfcDerivedUnit || *ty == IfcMonetaryUnit)
                .then_some(EntityKind::Unit),
            EntityClass::Material => matches!(
                ty,
                IfcMaterial
                    | IfcMaterialList
                    | IfcMaterialLayer
                    | IfcMaterialLayerSet
                    | IfcMaterialLayerSetUsage
            )
            .then_some(EntityKind::Material),
        }
    }
}

fn is_handled_curve(ty: &IfcType) -> bool {
    ty.is_subtype_of(&IfcType::IfcCurve)
        && !ty.is_subtype_of(&IfcType::IfcBSplineCurve)
        && !matches!(ty, IfcType::IfcCurve | IfcType::IfcConic | IfcType::IfcBoundedCurve)
}

/// Construction state of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Registered, attributes still being read
    UnderConstruction,
    Ready,
    Skipped,
    Failed,
}

/// IfcRoot attributes
#[derive(Debug, Clone, PartialEq)]
pub struct RootFields {
    pub global_id: String,
    /// Derived from the global id, or from the STEP id when that is invalid
    pub app_guid: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner_history: Option<EntityId>,
}

/// Object definition attributes and materialization state
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionFields {
    /// Decomposition and containment children, by id only
    pub children: Vec<EntityId>,
    pub groups: Vec<EntityHandle>,
    pub materials: Vec<String>,
    pub shape_type: String,
    /// Set at most once
    pub created: Option<ElementHandle>,
    /// Cleared for good when creation fails
    pub valid_for_creation: bool,
}

/// IfcProduct and IfcElement attributes
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub object_type: Option<String>,
    /// Absolute object placement
    pub placement: Matrix4<f64>,
    pub shape: Option<EntityHandle>,
    pub tag: Option<String>,
    /// Opening elements voiding this element, by id only
    pub openings: Vec<EntityId>,
    pub type_object: Option<EntityId>,
    /// World geometry, computed on first use
    pub geometry: Option<GeometrySet>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpatialFields {
    pub long_name: Option<String>,
    pub elevation: Option<f64>,
}

/// Members register themselves here while they are processed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupFields {
    pub members: Vec<EntityHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub corner: Point3<f64>,
    pub size: Vector3<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepresentationFields {
    pub context: Option<EntityId>,
    pub identifier: Option<String>,
    pub representation_type: Option<String>,
    pub items: Vec<EntityHandle>,
    /// Only read for "Box" representations
    pub bounding_box: Option<BoundingBox>,
    pub layer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepresentationMapFields {
    pub origin: Matrix4<f64>,
    pub representation: EntityHandle,
}

/// Profile geometry in its local XY plane
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileArea {
    /// One or more closed areas (several for composite profiles)
    Areas(Vec<Profile>),
    /// Open curve, swept into a surface
    Open(CurveLoop),
}

impl ProfileArea {
    pub fn transformed(&self, m: &Matrix4<f64>) -> Self {
        match self {
            ProfileArea::Areas(areas) => {
                ProfileArea::Areas(areas.iter().map(|p| p.transformed(m)).collect())
            }
            ProfileArea::Open(curve) => ProfileArea::Open(curve.transformed(m)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialFields {
    pub names: Vec<String>,
    pub layer_thicknesses: Vec<f64>,
}

/// One cached entity
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub ifc_type: IfcType,
    pub kind: EntityKind,
    pub state: SlotState,
    pub root: Option<RootFields>,
    pub definition: Option<DefinitionFields>,
    pub product: Option<ProductFields>,
    pub spatial: Option<SpatialFields>,
    pub group: Option<GroupFields>,
    pub placement: Option<Matrix4<f64>>,
    pub curve: Option<CurveGeometry>,
    pub profile: Option<ProfileArea>,
    pub product_shape: Option<Vec<EntityHandle>>,
    pub representation: Option<RepresentationFields>,
    pub representation_map: Option<RepresentationMapFields>,
    pub item: Option<GeometrySet>,
    pub unit: Option<Unit>,
    pub material: Option<MaterialFields>,
}

impl Entity {
    /// Empty slot, published before any attribute is read
    pub fn reserve(id: EntityId, ifc_type: IfcType, kind: EntityKind) -> Self {
        Self {
            id,
            ifc_type,
            kind,
            state: SlotState::UnderConstruction,
            root: None,
            definition: None,
            product: None,
            spatial: None,
            group: None,
            placement: None,
            curve: None,
            profile: None,
            product_shape: None,
            representation: None,
            representation_map: None,
            item: None,
            unit: None,
            material: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == SlotState::Ready
    }

    pub fn name(&self) -> Option<&str> {
        self.root.as_ref().and_then(|r| r.name.as_deref())
    }

    pub fn global_id(&self) -> Option<&str> {
        self.root.as_ref().map(|r| r.global_id.as_str())
    }

    pub fn created(&self) -> Option<ElementHandle> {
        self.definition.as_ref().and_then(|d| d.created)
    }

    /// Drop the fields only needed until the element exists
    pub fn clean(&mut self) {
        if let Some(product) = self.product.as_mut() {
            product.geometry = None;
            product.shape = None;
            product.openings.clear();
        }
        if let Some(definition) = self.definition.as_mut() {
            definition.children.clear();
            definition.children.shrink_to_fit();
        }
        self.item = None;
        self.curve = None;
        self.profile = None;
    }

    pub fn is_clean(&self) -> bool {
        self.product
            .as_ref()
            .map(|p| p.geometry.is_none() && p.shape.is_none())
            .unwrap_or(true)
    }
}

fn fill<T>(
    session: &mut ImportSession<'_>,
    handle: EntityHandle,
    result: Result<T>,
    set: impl FnOnce(&mut Entity, T),
) -> Processed<()> {
    match result {
        Ok(value) => {
            set(session.entity_mut(handle), value);
            Processed::Ready(())
        }
        Err(err) => Processed::Failed(err),
    }
}

/// Read the record into the reserved slot
pub(crate) fn populate(
    session: &mut ImportSession<'_>,
    handle: EntityHandle,
    record: &DecodedEntity,
) -> Processed<()> {
    let kind = session.entity(handle).kind;
    if kind.is_object_definition() {
        return object::populate(session, handle, record);
    }
    match kind {
        EntityKind::Placement => {
            let result = placement::build(session, record);
            fill(session, handle, result, |e, m| e.placement = Some(m))
        }
        EntityKind::Curve => {
            let result = curve::build(session, record);
            fill(session, handle, result, |e, c| e.curve = Some(c))
        }
        EntityKind::Profile => {
            let result = profile::build(session, record);
            fill(session, handle, result, |e, p| e.profile = Some(p))
        }
        EntityKind::ProductShape => {
            let result = representation::build_product_shape(session, record);
            fill(session, handle, result, |e, reps| e.product_shape = Some(reps))
        }
        EntityKind::Representation => {
            let result = representation::build_representation(session, record);
            fill(session, handle, result, |e, rep| e.representation = Some(rep))
        }
        EntityKind::RepresentationMap => {
            let result = representation::build_map(session, record);
            fill(session, handle, result, |e, map| e.representation_map = Some(map))
        }
        EntityKind::Item => {
            let result = items::build(session, record);
            fill(session, handle, result, |e, geometry| e.item = Some(geometry))
        }
        EntityKind::Unit => {
            let result = units::build_unit(session, record);
            fill(session, handle, result, |e, unit| e.unit = Some(unit))
        }
        EntityKind::Material => {
            let result = object::build_material(session, record);
            fill(session, handle, result, |e, material| e.material = Some(material))
        }
        _ => Processed::Ready(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_closed_subtype_sets() {
        use EntityClass as C;
        assert_eq!(
            EntityKind::classify(&IfcType::IfcWallStandardCase, C::ObjectDefinition),
            Some(EntityKind::Element)
        );
        assert_eq!(
            EntityKind::classify(&IfcType::IfcOpeningElement, C::ObjectDefinition),
            Some(EntityKind::Opening)
        );
        assert_eq!(
            EntityKind::classify(&IfcType::IfcTrimmedCurve, C::Item),
            Some(EntityKind::Curve)
        );
        assert_eq!(EntityKind::classify(&IfcType::IfcBSplineCurveWithKnots, C::Curve), None);
        assert_eq!(
            EntityKind::classify(&IfcType::Unknown("IFCFUTURESOLID".into()), C::Item),
            None
        );
        assert_eq!(EntityKind::classify(&IfcType::IfcCircle, C::Profile), None);
    }

    #[test]
    fn test_curves_double_as_items() {
        assert!(EntityKind::Curve.is_a(EntityClass::Item));
        assert!(!EntityKind::Item.is_a(EntityClass::Curve));
        assert!(EntityKind::Group.is_a(EntityClass::ObjectDefinition));
        assert!(!EntityKind::Group.is_product());
    }

    #[test]
    fn test_clean_drops_heavy_fields() {
        let mut entity = Entity::reserve(EntityId(1), IfcType::IfcWall, EntityKind::Element);
        entity.product = Some(ProductFields {
            object_type: None,
            placement: Matrix4::identity(),
            shape: None,
            tag: Some("W1".into()),
            openings: vec![EntityId(9)],
            type_object: None,
            geometry: Some(GeometrySet::default()),
        });
        assert!(!entity.is_clean());
        entity.clean();
        assert!(entity.is_clean());
        assert_eq!(entity.product.unwrap().tag.as_deref(), Some("W1"));
    }
}
