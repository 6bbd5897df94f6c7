// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Supertype tree and per-level attribute names
//!
//! Only the part of the schema the importer reads is tabulated. Attribute
//! positions follow IFC2x3; IFC4 appends to the same lists, so positional
//! access stays valid for both.

use crate::IfcType;

impl IfcType {
    /// Direct supertype, `None` for roots of the tree and unknown types
    pub fn supertype(&self) -> Option<IfcType> {
        use IfcType::*;
        let parent = match self {
            IfcObjectDefinition | IfcRelationship => IfcRoot,
            IfcObject | IfcTypeObject => IfcObjectDefinition,
            IfcProduct | IfcProject | IfcGroup => IfcObject,
            IfcSystem | IfcZone => IfcGroup,

            IfcSpatialStructureElement | IfcElement => IfcProduct,
            IfcSite | IfcBuilding | IfcBuildingStorey | IfcSpace => IfcSpatialStructureElement,

            IfcBuildingElement | IfcElementAssembly | IfcFurnishingElement
            | IfcDistributionElement | IfcFeatureElement => IfcElement,
            IfcWall | IfcCurtainWall | IfcSlab | IfcRoof | IfcBeam | IfcColumn | IfcDoor
            | IfcWindow | IfcStair | IfcStairFlight | IfcRamp | IfcRampFlight | IfcRailing
            | IfcCovering | IfcPlate | IfcMember | IfcFooting | IfcPile
            | IfcBuildingElementProxy => IfcBuildingElement,
            IfcWallStandardCase => IfcWall,
            IfcFurniture => IfcFurnishingElement,
            IfcDistributionFlowElement => IfcDistributionElement,
            IfcFlowTerminal | IfcFlowSegment | IfcFlowFitting => IfcDistributionFlowElement,
            IfcFeatureElementSubtraction => IfcFeatureElement,
            IfcOpeningElement => IfcFeatureElementSubtraction,

            IfcTypeProduct => IfcTypeObject,
            IfcElementType => IfcTypeProduct,
            IfcWallType | IfcSlabType | IfcBeamType | IfcColumnType
            | IfcBuildingElementProxyType => IfcElementType,

            IfcRelAggregates | IfcRelNests | IfcRelContainedInSpatialStructure
            | IfcRelAssignsToGroup | IfcRelVoidsElement | IfcRelFillsElement
            | IfcRelAssociatesMaterial | IfcRelDefinesByType => IfcRelationship,

            IfcGeometricRepresentationContext => IfcRepresentationContext,
            IfcGeometricRepresentationSubContext => IfcGeometricRepresentationContext,
            IfcShapeRepresentation => IfcRepresentation,
            IfcProductDefinitionShape => IfcProductRepresentation,

            IfcGeometricRepresentationItem | IfcMappedItem
            | IfcTopologicalRepresentationItem => IfcRepresentationItem,

            IfcCartesianPoint | IfcCartesianPointList2D | IfcCartesianPointList3D
            | IfcDirection | IfcVector | IfcPlacement | IfcCartesianTransformationOperator
            | IfcCurve | IfcCompositeCurveSegment | IfcSurface | IfcBoundingBox
            | IfcSolidModel | IfcBooleanResult | IfcHalfSpaceSolid | IfcCsgPrimitive3D
            | IfcShellBasedSurfaceModel | IfcFaceBasedSurfaceModel
            | IfcTessellatedItem => IfcGeometricRepresentationItem,

            IfcAxis1Placement | IfcAxis2Placement2D | IfcAxis2Placement3D => IfcPlacement,
            IfcLocalPlacement => IfcObjectPlacement,
            IfcCartesianTransformationOperator2D | IfcCartesianTransformationOperator3D => {
                IfcCartesianTransformationOperator
            }
            IfcCartesianTransformationOperator2DnonUniform => {
                IfcCartesianTransformationOperator2D
            }
            IfcCartesianTransformationOperator3DnonUniform => {
                IfcCartesianTransformationOperator3D
            }

            IfcLine | IfcConic | IfcBoundedCurve | IfcOffsetCurve2D | IfcOffsetCurve3D => {
                IfcCurve
            }
            IfcCircle | IfcEllipse => IfcConic,
            IfcPolyline | IfcTrimmedCurve | IfcCompositeCurve | IfcIndexedPolyCurve
            | IfcBSplineCurve => IfcBoundedCurve,
            IfcBSplineCurveWithKnots => IfcBSplineCurve,

            IfcElementarySurface => IfcSurface,
            IfcPlane | IfcCylindricalSurface => IfcElementarySurface,

            IfcSweptAreaSolid | IfcSweptDiskSolid | IfcManifoldSolidBrep | IfcCsgSolid => {
                IfcSolidModel
            }
            IfcExtrudedAreaSolid | IfcRevolvedAreaSolid | IfcSurfaceCurveSweptAreaSolid => {
                IfcSweptAreaSolid
            }
            IfcFacetedBrep | IfcAdvancedBrep => IfcManifoldSolidBrep,
            IfcFacetedBrepWithVoids => IfcFacetedBrep,
            IfcBooleanClippingResult => IfcBooleanResult,
            IfcBlock | IfcRightCircularCylinder | IfcRightCircularCone | IfcSphere
            | IfcRectangularPyramid => IfcCsgPrimitive3D,
            IfcTessellatedFaceSet => IfcTessellatedItem,
            IfcTriangulatedFaceSet => IfcTessellatedFaceSet,

            IfcConnectedFaceSet | IfcFace | IfcFaceBound | IfcLoop | IfcEdge | IfcVertex => {
                IfcTopologicalRepresentationItem
            }
            IfcClosedShell | IfcOpenShell => IfcConnectedFaceSet,
            IfcFaceSurface => IfcFace,
            IfcAdvancedFace => IfcFaceSurface,
            IfcFaceOuterBound => IfcFaceBound,
            IfcPolyLoop | IfcEdgeLoop => IfcLoop,
            IfcOrientedEdge | IfcEdgeCurve => IfcEdge,
            IfcVertexPoint => IfcVertex,

            IfcArbitraryClosedProfileDef | IfcArbitraryOpenProfileDef
            | IfcParameterizedProfileDef | IfcDerivedProfileDef | IfcCompositeProfileDef => {
                IfcProfileDef
            }
            IfcArbitraryProfileDefWithVoids => IfcArbitraryClosedProfileDef,
            IfcCenterLineProfileDef => IfcArbitraryOpenProfileDef,
            IfcRectangleProfileDef | IfcCircleProfileDef | IfcEllipseProfileDef
            | IfcIShapeProfileDef | IfcLShapeProfileDef | IfcTShapeProfileDef
            | IfcUShapeProfileDef | IfcCShapeProfileDef => IfcParameterizedProfileDef,
            IfcRectangleHollowProfileDef | IfcRoundedRectangleProfileDef => {
                IfcRectangleProfileDef
            }
            IfcCircleHollowProfileDef => IfcCircleProfileDef,

            IfcSIUnit | IfcConversionBasedUnit | IfcContextDependentUnit => IfcNamedUnit,
            IfcConversionBasedUnitWithOffset => IfcConversionBasedUnit,

            _ => return None,
        };
        Some(parent)
    }

    /// True when `self` is `ancestor` or one of its descendants
    pub fn is_subtype_of(&self, ancestor: &IfcType) -> bool {
        let mut current = Some(self.clone());
        while let Some(ty) = current {
            if &ty == ancestor {
                return true;
            }
            current = ty.supertype();
        }
        false
    }

    /// Attribute names declared at this level of the schema (not inherited)
    pub fn own_attributes(&self) -> &'static [&'static str] {
        use IfcType::*;
        match self {
            IfcRoot => &["GlobalId", "OwnerHistory", "Name", "Description"],
            IfcObject => &["ObjectType"],
            IfcProduct => &["ObjectPlacement", "Representation"],
            IfcProject => &["LongName", "Phase", "RepresentationContexts", "UnitsInContext"],
            IfcElement => &["Tag"],
            IfcDoor | IfcWindow => &["OverallHeight", "OverallWidth"],
            IfcSpatialStructureElement => &["LongName", "CompositionType"],
            IfcSite => &[
                "RefLatitude",
                "RefLongitude",
                "RefElevation",
                "LandTitleNumber",
                "SiteAddress",
            ],
            IfcBuilding => &["ElevationOfRefHeight", "ElevationOfTerrain", "BuildingAddress"],
            IfcBuildingStorey => &["Elevation"],
            IfcSpace => &["InteriorOrExteriorSpace", "ElevationWithFlooring"],
            IfcTypeObject => &["ApplicableOccurrence", "HasPropertySets"],
            IfcTypeProduct => &["RepresentationMaps", "Tag"],
            IfcElementType => &["ElementType"],
            IfcOwnerHistory => &[
                "OwningUser",
                "OwningApplication",
                "State",
                "ChangeAction",
                "LastModifiedDate",
                "LastModifyingUser",
                "LastModifyingApplication",
                "CreationDate",
            ],

            IfcRelAggregates | IfcRelNests => &["RelatingObject", "RelatedObjects"],
            IfcRelContainedInSpatialStructure => &["RelatedElements", "RelatingStructure"],
            IfcRelAssignsToGroup => &["RelatedObjects", "RelatedObjectsType", "RelatingGroup"],
            IfcRelVoidsElement => &["RelatingBuildingElement", "RelatedOpeningElement"],
            IfcRelFillsElement => &["RelatingOpeningElement", "RelatedBuildingElement"],
            IfcRelAssociatesMaterial => &["RelatedObjects", "RelatingMaterial"],
            IfcRelDefinesByType => &["RelatedObjects", "RelatingType"],

            IfcPresentationLayerAssignment => {
                &["Name", "Description", "AssignedItems", "Identifier"]
            }
            IfcMaterial => &["Name", "Description", "Category"],
            IfcMaterialList => &["Materials"],
            IfcMaterialLayer => &["Material", "LayerThickness", "IsVentilated"],
            IfcMaterialLayerSet => &["MaterialLayers", "LayerSetName"],
            IfcMaterialLayerSetUsage => &[
                "ForLayerSet",
                "LayerSetDirection",
                "DirectionSense",
                "OffsetFromReferenceLine",
            ],

            IfcRepresentationContext => &["ContextIdentifier", "ContextType"],
            IfcGeometricRepresentationContext => &[
                "CoordinateSpaceDimension",
                "Precision",
                "WorldCoordinateSystem",
                "TrueNorth",
            ],
            IfcGeometricRepresentationSubContext => &[
                "ParentContext",
                "TargetScale",
                "TargetView",
                "UserDefinedTargetView",
            ],
            IfcRepresentation => &[
                "ContextOfItems",
                "RepresentationIdentifier",
                "RepresentationType",
                "Items",
            ],
            IfcProductRepresentation => &["Name", "Description", "Representations"],
            IfcRepresentationMap => &["MappingOrigin", "MappedRepresentation"],
            IfcMappedItem => &["MappingSource", "MappingTarget"],

            IfcCartesianPoint => &["Coordinates"],
            IfcCartesianPointList2D | IfcCartesianPointList3D => &["CoordList"],
            IfcDirection => &["DirectionRatios"],
            IfcVector => &["Orientation", "Magnitude"],
            IfcPlacement => &["Location"],
            IfcAxis1Placement => &["Axis"],
            IfcAxis2Placement2D => &["RefDirection"],
            IfcAxis2Placement3D => &["Axis", "RefDirection"],
            IfcLocalPlacement => &["PlacementRelTo", "RelativePlacement"],
            IfcCartesianTransformationOperator => &["Axis1", "Axis2", "LocalOrigin", "Scale"],
            IfcCartesianTransformationOperator2DnonUniform => &["Scale2"],
            IfcCartesianTransformationOperator3D => &["Axis3"],
            IfcCartesianTransformationOperator3DnonUniform => &["Scale2", "Scale3"],

            IfcLine => &["Pnt", "Dir"],
            IfcConic => &["Position"],
            IfcCircle => &["Radius"],
            IfcEllipse => &["SemiAxis1", "SemiAxis2"],
            IfcPolyline => &["Points"],
            IfcTrimmedCurve => &[
                "BasisCurve",
                "Trim1",
                "Trim2",
                "SenseAgreement",
                "MasterRepresentation",
            ],
            IfcCompositeCurve => &["Segments", "SelfIntersect"],
            IfcCompositeCurveSegment => &["Transition", "SameSense", "ParentCurve"],
            IfcIndexedPolyCurve => &["Points", "Segments", "SelfIntersect"],
            IfcBSplineCurve => &[
                "Degree",
                "ControlPointsList",
                "CurveForm",
                "ClosedCurve",
                "SelfIntersect",
            ],
            IfcBSplineCurveWithKnots => &["KnotMultiplicities", "Knots", "KnotSpec"],
            IfcOffsetCurve2D => &["BasisCurve", "Distance", "SelfIntersect"],
            IfcOffsetCurve3D => &["BasisCurve", "Distance", "SelfIntersect", "RefDirection"],

            IfcElementarySurface => &["Position"],
            IfcCylindricalSurface => &["Radius"],

            IfcBoundingBox => &["Corner", "XDim", "YDim", "ZDim"],
            IfcSweptAreaSolid => &["SweptArea", "Position"],
            IfcExtrudedAreaSolid => &["ExtrudedDirection", "Depth"],
            IfcRevolvedAreaSolid => &["Axis", "Angle"],
            IfcSurfaceCurveSweptAreaSolid => {
                &["Directrix", "StartParam", "EndParam", "ReferenceSurface"]
            }
            IfcSweptDiskSolid => {
                &["Directrix", "Radius", "InnerRadius", "StartParam", "EndParam"]
            }
            IfcManifoldSolidBrep => &["Outer"],
            IfcFacetedBrepWithVoids => &["Voids"],
            IfcCsgSolid => &["TreeRootExpression"],
            IfcBooleanResult => &["Operator", "FirstOperand", "SecondOperand"],
            IfcHalfSpaceSolid => &["BaseSurface", "AgreementFlag"],
            IfcCsgPrimitive3D => &["Position"],
            IfcBlock => &["XLength", "YLength", "ZLength"],
            IfcRightCircularCylinder => &["Height", "Radius"],
            IfcRightCircularCone => &["Height", "BottomRadius"],
            IfcSphere => &["Radius"],
            IfcRectangularPyramid => &["XLength", "YLength", "Height"],
            IfcShellBasedSurfaceModel => &["SbsmBoundary"],
            IfcFaceBasedSurfaceModel => &["FbsmFaces"],
            IfcTessellatedFaceSet => &["Coordinates"],
            IfcTriangulatedFaceSet => &["Normals", "Closed", "CoordIndex", "PnIndex"],

            IfcConnectedFaceSet => &["CfsFaces"],
            IfcFace => &["Bounds"],
            IfcFaceSurface => &["FaceSurface", "SameSense"],
            IfcFaceBound => &["Bound", "Orientation"],
            IfcPolyLoop => &["Polygon"],
            IfcEdgeLoop => &["EdgeList"],
            IfcEdge => &["EdgeStart", "EdgeEnd"],
            IfcOrientedEdge => &["EdgeElement", "Orientation"],
            IfcEdgeCurve => &["EdgeGeometry", "SameSense"],
            IfcVertexPoint => &["VertexGeometry"],

            IfcProfileDef => &["ProfileType", "ProfileName"],
            IfcArbitraryClosedProfileDef => &["OuterCurve"],
            IfcArbitraryProfileDefWithVoids => &["InnerCurves"],
            IfcArbitraryOpenProfileDef => &["Curve"],
            IfcCenterLineProfileDef => &["Thickness"],
            IfcParameterizedProfileDef => &["Position"],
            IfcRectangleProfileDef => &["XDim", "YDim"],
            IfcRectangleHollowProfileDef => {
                &["WallThickness", "InnerFilletRadius", "OuterFilletRadius"]
            }
            IfcRoundedRectangleProfileDef => &["RoundingRadius"],
            IfcCircleProfileDef => &["Radius"],
            IfcCircleHollowProfileDef => &["WallThickness"],
            IfcEllipseProfileDef => &["SemiAxis1", "SemiAxis2"],
            IfcIShapeProfileDef => &[
                "OverallWidth",
                "OverallDepth",
                "WebThickness",
                "FlangeThickness",
                "FilletRadius",
            ],
            IfcLShapeProfileDef => {
                &["Depth", "Width", "Thickness", "FilletRadius", "EdgeRadius", "LegSlope"]
            }
            IfcTShapeProfileDef => &[
                "Depth",
                "FlangeWidth",
                "WebThickness",
                "FlangeThickness",
                "FilletRadius",
                "FlangeEdgeRadius",
                "WebEdgeRadius",
                "WebSlope",
                "FlangeSlope",
            ],
            IfcUShapeProfileDef => &[
                "Depth",
                "FlangeWidth",
                "WebThickness",
                "FlangeThickness",
                "FilletRadius",
                "EdgeRadius",
                "FlangeSlope",
            ],
            IfcCShapeProfileDef => {
                &["Depth", "Width", "WallThickness", "Girth", "InternalFilletRadius"]
            }
            IfcDerivedProfileDef => &["ParentProfile", "Operator", "Label"],
            IfcCompositeProfileDef => &["Profiles", "Label"],

            IfcUnitAssignment => &["Units"],
            IfcNamedUnit => &["Dimensions", "UnitType"],
            IfcSIUnit => &["Prefix", "Name"],
            IfcConversionBasedUnit => &["Name", "ConversionFactor"],
            IfcConversionBasedUnitWithOffset => &["ConversionOffset"],
            IfcContextDependentUnit => &["Name"],
            IfcDerivedUnit => &["Elements", "UnitType", "UserDefinedType"],
            IfcDerivedUnitElement => &["Unit", "Exponent"],
            IfcMeasureWithUnit => &["ValueComponent", "UnitComponent"],
            IfcMonetaryUnit => &["Currency"],
            IfcDimensionalExponents => &[
                "LengthExponent",
                "MassExponent",
                "TimeExponent",
                "ElectricCurrentExponent",
                "ThermodynamicTemperatureExponent",
                "AmountOfSubstanceExponent",
                "LuminousIntensityExponent",
            ],

            _ => &[],
        }
    }

    /// Position of a named attribute in the flattened record
    ///
    /// Supertype attributes come first, so the lookup walks from the root of
    /// the tree down to `self`.
    pub fn attribute_index(&self, name: &str) -> Option<usize> {
        let mut chain = Vec::new();
        let mut current = Some(self.clone());
        while let Some(ty) = current {
            current = ty.supertype();
            chain.push(ty);
        }

        let mut offset = 0;
        for ty in chain.iter().rev() {
            let own = ty.own_attributes();
            if let Some(pos) = own.iter().position(|a| a.eq_ignore_ascii_case(name)) {
                return Some(offset + pos);
            }
            offset += own.len();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_chain() {
        assert!(IfcType::IfcWallStandardCase.is_subtype_of(&IfcType::IfcWall));
        assert!(IfcType::IfcWallStandardCase.is_subtype_of(&IfcType::IfcProduct));
        assert!(IfcType::IfcWallStandardCase.is_subtype_of(&IfcType::IfcRoot));
        assert!(IfcType::IfcCircle.is_subtype_of(&IfcType::IfcCurve));
        assert!(IfcType::IfcFacetedBrepWithVoids.is_subtype_of(&IfcType::IfcManifoldSolidBrep));
        assert!(!IfcType::IfcCircle.is_subtype_of(&IfcType::IfcSolidModel));
        assert!(!IfcType::Unknown("IFCFOO".into()).is_subtype_of(&IfcType::IfcRoot));
    }

    #[test]
    fn test_attribute_index_includes_supertypes() {
        assert_eq!(IfcType::IfcWall.attribute_index("GlobalId"), Some(0));
        assert_eq!(IfcType::IfcWall.attribute_index("Name"), Some(2));
        assert_eq!(IfcType::IfcWall.attribute_index("ObjectPlacement"), Some(5));
        assert_eq!(IfcType::IfcWall.attribute_index("Tag"), Some(7));
        assert_eq!(IfcType::IfcProject.attribute_index("UnitsInContext"), Some(8));
        assert_eq!(IfcType::IfcBuildingStorey.attribute_index("Elevation"), Some(9));
        assert_eq!(IfcType::IfcCircle.attribute_index("Radius"), Some(1));
        assert_eq!(IfcType::IfcExtrudedAreaSolid.attribute_index("Depth"), Some(3));
        assert_eq!(IfcType::IfcTrimmedCurve.attribute_index("MasterRepresentation"), Some(4));
        assert_eq!(IfcType::IfcIShapeProfileDef.attribute_index("FilletRadius"), Some(7));
        assert_eq!(IfcType::IfcCircleHollowProfileDef.attribute_index("WallThickness"), Some(4));
        assert_eq!(IfcType::IfcSIUnit.attribute_index("Name"), Some(3));
        assert_eq!(IfcType::IfcOrientedEdge.attribute_index("Orientation"), Some(3));
        assert_eq!(IfcType::IfcFaceOuterBound.attribute_index("Orientation"), Some(1));
        assert_eq!(
            IfcType::IfcCartesianTransformationOperator3DnonUniform.attribute_index("Scale3"),
            Some(6)
        );
    }

    #[test]
    fn test_unknown_attribute() {
        assert_eq!(IfcType::IfcWall.attribute_index("Radius"), None);
    }
}
