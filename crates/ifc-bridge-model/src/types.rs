// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for IFC attribute records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe entity identifier
///
/// Wraps the raw STEP id (e.g., #123 becomes EntityId(123)). Stable for the
/// lifetime of a file and used as the identity key of every cache.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize, Default,
)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        EntityId(id)
    }
}

impl From<EntityId> for u32 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

macro_rules! ifc_types {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// IFC entity type enumeration
        ///
        /// The closed set of types the importer dispatches on, including the
        /// abstract supertypes needed for subtype checks. Anything else is
        /// captured as `Unknown` with its upper-case STEP name.
        #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub enum IfcType {
            $($variant,)*
            /// Type not known to the importer
            Unknown(String),
        }

        impl IfcType {
            /// Parse a STEP type name (case-insensitive)
            pub fn parse(s: &str) -> Self {
                let upper = s.to_ascii_uppercase();
                match upper.as_str() {
                    $($name => IfcType::$variant,)*
                    _ => IfcType::Unknown(upper),
                }
            }

            /// Upper-case STEP name (e.g. "IFCWALL")
            pub fn name(&self) -> &str {
                match self {
                    $(IfcType::$variant => $name,)*
                    IfcType::Unknown(s) => s,
                }
            }

            /// Schema class name (e.g. "IfcWall")
            pub fn class_name(&self) -> &str {
                match self {
                    $(IfcType::$variant => stringify!($variant),)*
                    IfcType::Unknown(s) => s,
                }
            }
        }
    };
}

ifc_types! {
    // Kernel
    IfcRoot => "IFCROOT",
    IfcObjectDefinition => "IFCOBJECTDEFINITION",
    IfcObject => "IFCOBJECT",
    IfcProduct => "IFCPRODUCT",
    IfcProject => "IFCPROJECT",
    IfcGroup => "IFCGROUP",
    IfcSystem => "IFCSYSTEM",
    IfcZone => "IFCZONE",
    IfcOwnerHistory => "IFCOWNERHISTORY",

    // Spatial structure
    IfcSpatialStructureElement => "IFCSPATIALSTRUCTUREELEMENT",
    IfcSite => "IFCSITE",
    IfcBuilding => "IFCBUILDING",
    IfcBuildingStorey => "IFCBUILDINGSTOREY",
    IfcSpace => "IFCSPACE",

    // Elements
    IfcElement => "IFCELEMENT",
    IfcBuildingElement => "IFCBUILDINGELEMENT",
    IfcWall => "IFCWALL",
    IfcWallStandardCase => "IFCWALLSTANDARDCASE",
    IfcCurtainWall => "IFCCURTAINWALL",
    IfcSlab => "IFCSLAB",
    IfcRoof => "IFCROOF",
    IfcBeam => "IFCBEAM",
    IfcColumn => "IFCCOLUMN",
    IfcDoor => "IFCDOOR",
    IfcWindow => "IFCWINDOW",
    IfcStair => "IFCSTAIR",
    IfcStairFlight => "IFCSTAIRFLIGHT",
    IfcRamp => "IFCRAMP",
    IfcRampFlight => "IFCRAMPFLIGHT",
    IfcRailing => "IFCRAILING",
    IfcCovering => "IFCCOVERING",
    IfcPlate => "IFCPLATE",
    IfcMember => "IFCMEMBER",
    IfcFooting => "IFCFOOTING",
    IfcPile => "IFCPILE",
    IfcBuildingElementProxy => "IFCBUILDINGELEMENTPROXY",
    IfcElementAssembly => "IFCELEMENTASSEMBLY",
    IfcFurnishingElement => "IFCFURNISHINGELEMENT",
    IfcFurniture => "IFCFURNITURE",
    IfcDistributionElement => "IFCDISTRIBUTIONELEMENT",
    IfcDistributionFlowElement => "IFCDISTRIBUTIONFLOWELEMENT",
    IfcFlowTerminal => "IFCFLOWTERMINAL",
    IfcFlowSegment => "IFCFLOWSEGMENT",
    IfcFlowFitting => "IFCFLOWFITTING",
    IfcFeatureElement => "IFCFEATUREELEMENT",
    IfcFeatureElementSubtraction => "IFCFEATUREELEMENTSUBTRACTION",
    IfcOpeningElement => "IFCOPENINGELEMENT",

    // Type objects
    IfcTypeObject => "IFCTYPEOBJECT",
    IfcTypeProduct => "IFCTYPEPRODUCT",
    IfcElementType => "IFCELEMENTTYPE",
    IfcWallType => "IFCWALLTYPE",
    IfcSlabType => "IFCSLABTYPE",
    IfcBeamType => "IFCBEAMTYPE",
    IfcColumnType => "IFCCOLUMNTYPE",
    IfcBuildingElementProxyType => "IFCBUILDINGELEMENTPROXYTYPE",

    // Relationships
    IfcRelationship => "IFCRELATIONSHIP",
    IfcRelAggregates => "IFCRELAGGREGATES",
    IfcRelNests => "IFCRELNESTS",
    IfcRelContainedInSpatialStructure => "IFCRELCONTAINEDINSPATIALSTRUCTURE",
    IfcRelAssignsToGroup => "IFCRELASSIGNSTOGROUP",
    IfcRelVoidsElement => "IFCRELVOIDSELEMENT",
    IfcRelFillsElement => "IFCRELFILLSELEMENT",
    IfcRelAssociatesMaterial => "IFCRELASSOCIATESMATERIAL",
    IfcRelDefinesByType => "IFCRELDEFINESBYTYPE",

    // Presentation and materials
    IfcPresentationLayerAssignment => "IFCPRESENTATIONLAYERASSIGNMENT",
    IfcMaterial => "IFCMATERIAL",
    IfcMaterialList => "IFCMATERIALLIST",
    IfcMaterialLayer => "IFCMATERIALLAYER",
    IfcMaterialLayerSet => "IFCMATERIALLAYERSET",
    IfcMaterialLayerSetUsage => "IFCMATERIALLAYERSETUSAGE",

    // Representations
    IfcRepresentationContext => "IFCREPRESENTATIONCONTEXT",
    IfcGeometricRepresentationContext => "IFCGEOMETRICREPRESENTATIONCONTEXT",
    IfcGeometricRepresentationSubContext => "IFCGEOMETRICREPRESENTATIONSUBCONTEXT",
    IfcRepresentation => "IFCREPRESENTATION",
    IfcShapeRepresentation => "IFCSHAPEREPRESENTATION",
    IfcProductRepresentation => "IFCPRODUCTREPRESENTATION",
    IfcProductDefinitionShape => "IFCPRODUCTDEFINITIONSHAPE",
    IfcRepresentationMap => "IFCREPRESENTATIONMAP",
    IfcRepresentationItem => "IFCREPRESENTATIONITEM",
    IfcGeometricRepresentationItem => "IFCGEOMETRICREPRESENTATIONITEM",
    IfcMappedItem => "IFCMAPPEDITEM",

    // Points, directions and placements
    IfcCartesianPoint => "IFCCARTESIANPOINT",
    IfcCartesianPointList2D => "IFCCARTESIANPOINTLIST2D",
    IfcCartesianPointList3D => "IFCCARTESIANPOINTLIST3D",
    IfcDirection => "IFCDIRECTION",
    IfcVector => "IFCVECTOR",
    IfcPlacement => "IFCPLACEMENT",
    IfcAxis1Placement => "IFCAXIS1PLACEMENT",
    IfcAxis2Placement2D => "IFCAXIS2PLACEMENT2D",
    IfcAxis2Placement3D => "IFCAXIS2PLACEMENT3D",
    IfcObjectPlacement => "IFCOBJECTPLACEMENT",
    IfcLocalPlacement => "IFCLOCALPLACEMENT",
    IfcCartesianTransformationOperator => "IFCCARTESIANTRANSFORMATIONOPERATOR",
    IfcCartesianTransformationOperator2D => "IFCCARTESIANTRANSFORMATIONOPERATOR2D",
    IfcCartesianTransformationOperator2DnonUniform => "IFCCARTESIANTRANSFORMATIONOPERATOR2DNONUNIFORM",
    IfcCartesianTransformationOperator3D => "IFCCARTESIANTRANSFORMATIONOPERATOR3D",
    IfcCartesianTransformationOperator3DnonUniform => "IFCCARTESIANTRANSFORMATIONOPERATOR3DNONUNIFORM",

    // Curves
    IfcCurve => "IFCCURVE",
    IfcLine => "IFCLINE",
    IfcConic => "IFCCONIC",
    IfcCircle => "IFCCIRCLE",
    IfcEllipse => "IFCELLIPSE",
    IfcBoundedCurve => "IFCBOUNDEDCURVE",
    IfcPolyline => "IFCPOLYLINE",
    IfcTrimmedCurve => "IFCTRIMMEDCURVE",
    IfcCompositeCurve => "IFCCOMPOSITECURVE",
    IfcCompositeCurveSegment => "IFCCOMPOSITECURVESEGMENT",
    IfcIndexedPolyCurve => "IFCINDEXEDPOLYCURVE",
    IfcBSplineCurve => "IFCBSPLINECURVE",
    IfcBSplineCurveWithKnots => "IFCBSPLINECURVEWITHKNOTS",
    IfcOffsetCurve2D => "IFCOFFSETCURVE2D",
    IfcOffsetCurve3D => "IFCOFFSETCURVE3D",

    // Surfaces
    IfcSurface => "IFCSURFACE",
    IfcElementarySurface => "IFCELEMENTARYSURFACE",
    IfcPlane => "IFCPLANE",
    IfcCylindricalSurface => "IFCCYLINDRICALSURFACE",

    // Solids
    IfcBoundingBox => "IFCBOUNDINGBOX",
    IfcSolidModel => "IFCSOLIDMODEL",
    IfcSweptAreaSolid => "IFCSWEPTAREASOLID",
    IfcExtrudedAreaSolid => "IFCEXTRUDEDAREASOLID",
    IfcRevolvedAreaSolid => "IFCREVOLVEDAREASOLID",
    IfcSurfaceCurveSweptAreaSolid => "IFCSURFACECURVESWEPTAREASOLID",
    IfcSweptDiskSolid => "IFCSWEPTDISKSOLID",
    IfcManifoldSolidBrep => "IFCMANIFOLDSOLIDBREP",
    IfcFacetedBrep => "IFCFACETEDBREP",
    IfcFacetedBrepWithVoids => "IFCFACETEDBREPWITHVOIDS",
    IfcAdvancedBrep => "IFCADVANCEDBREP",
    IfcCsgSolid => "IFCCSGSOLID",
    IfcBooleanResult => "IFCBOOLEANRESULT",
    IfcBooleanClippingResult => "IFCBOOLEANCLIPPINGRESULT",
    IfcHalfSpaceSolid => "IFCHALFSPACESOLID",
    IfcCsgPrimitive3D => "IFCCSGPRIMITIVE3D",
    IfcBlock => "IFCBLOCK",
    IfcRightCircularCylinder => "IFCRIGHTCIRCULARCYLINDER",
    IfcRightCircularCone => "IFCRIGHTCIRCULARCONE",
    IfcSphere => "IFCSPHERE",
    IfcRectangularPyramid => "IFCRECTANGULARPYRAMID",
    IfcShellBasedSurfaceModel => "IFCSHELLBASEDSURFACEMODEL",
    IfcFaceBasedSurfaceModel => "IFCFACEBASEDSURFACEMODEL",
    IfcTessellatedItem => "IFCTESSELLATEDITEM",
    IfcTessellatedFaceSet => "IFCTESSELLATEDFACESET",
    IfcTriangulatedFaceSet => "IFCTRIANGULATEDFACESET",

    // Topology
    IfcTopologicalRepresentationItem => "IFCTOPOLOGICALREPRESENTATIONITEM",
    IfcConnectedFaceSet => "IFCCONNECTEDFACESET",
    IfcClosedShell => "IFCCLOSEDSHELL",
    IfcOpenShell => "IFCOPENSHELL",
    IfcFace => "IFCFACE",
    IfcFaceSurface => "IFCFACESURFACE",
    IfcAdvancedFace => "IFCADVANCEDFACE",
    IfcFaceBound => "IFCFACEBOUND",
    IfcFaceOuterBound => "IFCFACEOUTERBOUND",
    IfcLoop => "IFCLOOP",
    IfcPolyLoop => "IFCPOLYLOOP",
    IfcEdgeLoop => "IFCEDGELOOP",
    IfcEdge => "IFCEDGE",
    IfcOrientedEdge => "IFCORIENTEDEDGE",
    IfcEdgeCurve => "IFCEDGECURVE",
    IfcVertex => "IFCVERTEX",
    IfcVertexPoint => "IFCVERTEXPOINT",

    // Profiles
    IfcProfileDef => "IFCPROFILEDEF",
    IfcArbitraryClosedProfileDef => "IFCARBITRARYCLOSEDPROFILEDEF",
    IfcArbitraryProfileDefWithVoids => "IFCARBITRARYPROFILEDEFWITHVOIDS",
    IfcArbitraryOpenProfileDef => "IFCARBITRARYOPENPROFILEDEF",
    IfcCenterLineProfileDef => "IFCCENTERLINEPROFILEDEF",
    IfcParameterizedProfileDef => "IFCPARAMETERIZEDPROFILEDEF",
    IfcRectangleProfileDef => "IFCRECTANGLEPROFILEDEF",
    IfcRectangleHollowProfileDef => "IFCRECTANGLEHOLLOWPROFILEDEF",
    IfcRoundedRectangleProfileDef => "IFCROUNDEDRECTANGLEPROFILEDEF",
    IfcCircleProfileDef => "IFCCIRCLEPROFILEDEF",
    IfcCircleHollowProfileDef => "IFCCIRCLEHOLLOWPROFILEDEF",
    IfcEllipseProfileDef => "IFCELLIPSEPROFILEDEF",
    IfcIShapeProfileDef => "IFCISHAPEPROFILEDEF",
    IfcLShapeProfileDef => "IFCLSHAPEPROFILEDEF",
    IfcTShapeProfileDef => "IFCTSHAPEPROFILEDEF",
    IfcUShapeProfileDef => "IFCUSHAPEPROFILEDEF",
    IfcCShapeProfileDef => "IFCCSHAPEPROFILEDEF",
    IfcDerivedProfileDef => "IFCDERIVEDPROFILEDEF",
    IfcCompositeProfileDef => "IFCCOMPOSITEPROFILEDEF",

    // Units
    IfcUnitAssignment => "IFCUNITASSIGNMENT",
    IfcNamedUnit => "IFCNAMEDUNIT",
    IfcSIUnit => "IFCSIUNIT",
    IfcConversionBasedUnit => "IFCCONVERSIONBASEDUNIT",
    IfcConversionBasedUnitWithOffset => "IFCCONVERSIONBASEDUNITWITHOFFSET",
    IfcContextDependentUnit => "IFCCONTEXTDEPENDENTUNIT",
    IfcDerivedUnit => "IFCDERIVEDUNIT",
    IfcDerivedUnitElement => "IFCDERIVEDUNITELEMENT",
    IfcMeasureWithUnit => "IFCMEASUREWITHUNIT",
    IfcMonetaryUnit => "IFCMONETARYUNIT",
    IfcDimensionalExponents => "IFCDIMENSIONALEXPONENTS",
}

impl Default for IfcType {
    fn default() -> Self {
        IfcType::Unknown(String::new())
    }
}

impl fmt::Display for IfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

/// Decoded attribute value
///
/// Represents any value that can appear in an entity's attribute list.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// Null value ($)
    #[default]
    Null,
    /// Derived value (*)
    Derived,
    /// Entity reference (#123)
    EntityRef(EntityId),
    /// Boolean value (.T. / .F.)
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value, escapes already resolved
    String(String),
    /// Enumeration value (.VALUE.)
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Typed value like IFCPARAMETERVALUE(0.5)
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    /// Try to get as entity reference
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Try to get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_string(),
            _ => None,
        }
    }

    /// Try to get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_float(),
            _ => None,
        }
    }

    /// Try to get as integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            AttributeValue::TypedValue(_, args) if !args.is_empty() => args[0].as_integer(),
            _ => None,
        }
    }

    /// Try to get as boolean
    ///
    /// `.U.` (unknown logical) yields `None`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            AttributeValue::Enum(s) => match s.to_ascii_uppercase().as_str() {
                "TRUE" | "T" => Some(true),
                "FALSE" | "F" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Try to get as enum string
    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as list
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// Name of a typed value (e.g. "IFCPARAMETERVALUE")
    pub fn type_tag(&self) -> Option<&str> {
        match self {
            AttributeValue::TypedValue(name, _) => Some(name),
            _ => None,
        }
    }

    /// Read a list of numbers, e.g. point coordinates or direction ratios
    pub fn as_float_list(&self) -> Option<Vec<f64>> {
        self.as_list()
            .map(|items| items.iter().filter_map(|v| v.as_float()).collect())
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Check if this is a derived value
    pub fn is_derived(&self) -> bool {
        matches!(self, AttributeValue::Derived)
    }
}

/// Decoded entity record
///
/// Attribute values are kept in declaration order, supertype attributes first.
#[derive(Clone, Debug)]
pub struct DecodedEntity {
    /// Entity ID
    pub id: EntityId,
    /// Entity type
    pub ifc_type: IfcType,
    /// Attribute values in order
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    /// Get attribute at index
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    /// Get attribute by schema name (e.g. "Radius"), `None` when the type
    /// does not declare it or the record is short
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.ifc_type
            .attribute_index(name)
            .and_then(|index| self.get(index))
    }

    /// Like [`attribute`](Self::attribute) but distinguishes an undeclared
    /// attribute from a null one
    pub fn require(&self, name: &str) -> crate::Result<&AttributeValue> {
        self.attribute(name)
            .ok_or_else(|| crate::ParseError::UnknownAttribute {
                entity: self.id,
                ifc_type: self.ifc_type.class_name().to_string(),
                attribute: name.to_string(),
            })
    }

    /// Entity reference by name
    pub fn ref_attr(&self, name: &str) -> Option<EntityId> {
        self.attribute(name).and_then(|v| v.as_entity_ref())
    }

    /// String by name
    pub fn string_attr(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|v| v.as_string())
    }

    /// Float by name
    pub fn float_attr(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(|v| v.as_float())
    }

    /// Integer by name
    pub fn integer_attr(&self, name: &str) -> Option<i64> {
        self.attribute(name).and_then(|v| v.as_integer())
    }

    /// Boolean by name
    pub fn bool_attr(&self, name: &str) -> Option<bool> {
        self.attribute(name).and_then(|v| v.as_bool())
    }

    /// Enum string by name
    pub fn enum_attr(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|v| v.as_enum())
    }

    /// List by name
    pub fn list_attr(&self, name: &str) -> Option<&[AttributeValue]> {
        self.attribute(name).and_then(|v| v.as_list())
    }

    /// List of entity references by name; non-reference members are dropped
    pub fn refs_attr(&self, name: &str) -> Vec<EntityId> {
        self.list_attr(name)
            .map(|list| list.iter().filter_map(|v| v.as_entity_ref()).collect())
            .unwrap_or_default()
    }

    /// Get entity reference at index
    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    /// Get float at index
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(|v| v.as_float())
    }

    /// Get list at index
    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(|v| v.as_list())
    }
}

/// File metadata read from the HEADER section
#[derive(Clone, Debug, Default)]
pub struct FileHeader {
    /// Schema identifier (e.g., "IFC2X3", "IFC4")
    pub schema_version: String,
    /// FILE_NAME name field
    pub file_name: Option<String>,
    /// FILE_NAME time stamp
    pub timestamp: Option<String>,
    /// FILE_NAME originating system
    pub originating_system: Option<String>,
    /// FILE_DESCRIPTION description entries
    pub description: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!(IfcType::parse("IFCWALL"), IfcType::IfcWall);
        assert_eq!(IfcType::parse("IfcTrimmedCurve"), IfcType::IfcTrimmedCurve);
        assert_eq!(
            IfcType::parse("IFCFANCYNEWTHING"),
            IfcType::Unknown("IFCFANCYNEWTHING".to_string())
        );
    }

    #[test]
    fn test_names() {
        assert_eq!(IfcType::IfcWallStandardCase.name(), "IFCWALLSTANDARDCASE");
        assert_eq!(IfcType::IfcWallStandardCase.class_name(), "IfcWallStandardCase");
        assert_eq!(IfcType::IfcSIUnit.to_string(), "IfcSIUnit");
    }

    #[test]
    fn test_attribute_by_name() {
        let circle = DecodedEntity {
            id: EntityId(10),
            ifc_type: IfcType::IfcCircle,
            attributes: vec![AttributeValue::EntityRef(EntityId(20)), AttributeValue::Float(5.0)],
        };
        assert_eq!(circle.ref_attr("Position"), Some(EntityId(20)));
        assert_eq!(circle.float_attr("Radius"), Some(5.0));
        assert!(circle.attribute("Depth").is_none());
        assert!(circle.require("Depth").is_err());
    }

    #[test]
    fn test_bool_and_typed_values() {
        assert_eq!(AttributeValue::Bool(true).as_bool(), Some(true));
        assert_eq!(AttributeValue::Enum("U".into()).as_bool(), None);
        let typed = AttributeValue::TypedValue(
            "IFCPARAMETERVALUE".into(),
            vec![AttributeValue::Float(0.25)],
        );
        assert_eq!(typed.type_tag(), Some("IFCPARAMETERVALUE"));
        assert_eq!(typed.as_float(), Some(0.25));
    }
}
