// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP (ISO 10303-21) writer for recognized extrusions
//!
//! Entities are numbered in the order they are added. Output targets the
//! IFC4 schema and reads back through `ifc-bridge-parser`.

use crate::error::{ExportError, Result};
use crate::extrusion::ExportExtrusion;
use crate::planar::{PlanarLoop, Segment2};
use crate::recognize::{Placement2, RecognizedProfile};
use ifc_bridge_geometry::{Frame, Point2, Point3, Vector2, Vector3};
use ifc_bridge_model::{EntityId, GlobalId};

pub const SCHEMA: &str = "IFC4";

/// STEP real literal: `1.`, `0.25`, `1e-10`
fn real(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(ExportError::NonFinite(value));
    }
    let text = format!("{value:?}");
    Ok(match text.strip_suffix(".0") {
        Some(integral) => format!("{integral}."),
        None => text,
    })
}

fn reals(values: &[f64]) -> Result<String> {
    let parts = values.iter().map(|v| real(*v)).collect::<Result<Vec<_>>>()?;
    Ok(parts.join(","))
}

/// Quoted STEP string; non-ASCII text goes into `\X2\` blocks
pub fn step_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    let mut wide: Vec<u16> = Vec::new();
    let flush = |wide: &mut Vec<u16>, out: &mut String| {
        if !wide.is_empty() {
            out.push_str("\\X2\\");
            for unit in wide.drain(..) {
                out.push_str(&format!("{unit:04X}"));
            }
            out.push_str("\\X0\\");
        }
    };
    for c in text.chars() {
        if c.is_ascii() && !c.is_ascii_control() {
            flush(&mut wide, &mut out);
            match c {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\X\\5C"),
                _ => out.push(c),
            }
        } else {
            let mut buf = [0u16; 2];
            wide.extend_from_slice(c.encode_utf16(&mut buf));
        }
    }
    flush(&mut wide, &mut out);
    out.push('\'');
    out
}

fn refs(ids: &[EntityId]) -> String {
    ids.iter().map(EntityId::to_string).collect::<Vec<_>>().join(",")
}

pub struct StepWriter {
    file_name: String,
    timestamp: String,
    entities: Vec<String>,
    context: Option<EntityId>,
}

impl Default for StepWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl StepWriter {
    pub fn new() -> Self {
        Self {
            file_name: "export.ifc".to_string(),
            timestamp: String::new(),
            entities: Vec::new(),
            context: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// ISO 8601 time stamp recorded in `FILE_NAME`
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn add(&mut self, record: String) -> EntityId {
        let id = EntityId(self.entities.len() as u32 + 1);
        self.entities.push(format!("{id}={record};"));
        id
    }

    pub fn point_2d(&mut self, p: &Point2<f64>) -> Result<EntityId> {
        let coordinates = reals(&[p.x, p.y])?;
        Ok(self.add(format!("IFCCARTESIANPOINT(({coordinates}))")))
    }

    pub fn point_3d(&mut self, p: &Point3<f64>) -> Result<EntityId> {
        let coordinates = reals(&[p.x, p.y, p.z])?;
        Ok(self.add(format!("IFCCARTESIANPOINT(({coordinates}))")))
    }

    pub fn direction_2d(&mut self, d: &Vector2<f64>) -> Result<EntityId> {
        let ratios = reals(&[d.x, d.y])?;
        Ok(self.add(format!("IFCDIRECTION(({ratios}))")))
    }

    pub fn direction_3d(&mut self, d: &Vector3<f64>) -> Result<EntityId> {
        let ratios = reals(&[d.x, d.y, d.z])?;
        Ok(self.add(format!("IFCDIRECTION(({ratios}))")))
    }

    pub fn placement_2d(&mut self, placement: &Placement2) -> Result<EntityId> {
        let location = self.point_2d(&placement.location)?;
        let reference = self.direction_2d(&placement.ref_direction)?;
        Ok(self.add(format!("IFCAXIS2PLACEMENT2D({location},{reference})")))
    }

    pub fn placement_3d(&mut self, frame: &Frame) -> Result<EntityId> {
        let location = self.point_3d(&frame.origin)?;
        let axis = self.direction_3d(&frame.normal())?;
        let reference = self.direction_3d(&frame.x_axis)?;
        Ok(self.add(format!("IFCAXIS2PLACEMENT3D({location},{axis},{reference})")))
    }

    /// The shared 3D model context, added on first use
    pub fn context(&mut self) -> Result<EntityId> {
        if let Some(context) = self.context {
            return Ok(context);
        }
        let world = self.placement_3d(&Frame::world())?;
        let context = self.add(format!(
            "IFCGEOMETRICREPRESENTATIONCONTEXT($,'Model',3,1.E-05,{world},$)"
        ));
        self.context = Some(context);
        Ok(context)
    }

    /// Project in SI metres and radians
    pub fn project(&mut self, global_id: &GlobalId, name: &str) -> Result<EntityId> {
        let length = self.add("IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.)".to_string());
        let angle = self.add("IFCSIUNIT(*,.PLANEANGLEUNIT.,$,.RADIAN.)".to_string());
        let units = self.add(format!("IFCUNITASSIGNMENT(({length},{angle}))"));
        let context = self.context()?;
        Ok(self.add(format!(
            "IFCPROJECT({},$,{},$,$,$,$,({context}),{units})",
            step_string(&global_id.encode()),
            step_string(name)
        )))
    }

    fn curve(&mut self, curve_loop: &PlanarLoop) -> Result<EntityId> {
        if let Some(corners) = curve_loop.corners() {
            let mut points = corners
                .iter()
                .map(|p| self.point_2d(p))
                .collect::<Result<Vec<_>>>()?;
            if let Some(&first) = points.first() {
                points.push(first);
            }
            return Ok(self.add(format!("IFCPOLYLINE(({}))", refs(&points))));
        }

        // Full circles are written as two half arcs
        let segments: Vec<Segment2> = curve_loop
            .segments()
            .iter()
            .flat_map(|s| match s {
                Segment2::Arc(arc) if arc.is_full() => {
                    let (a, b) = arc.halves();
                    vec![Segment2::Arc(a), Segment2::Arc(b)]
                }
                other => vec![other.clone()],
            })
            .collect();
        let Some(first) = segments.first() else {
            return Err(ExportError::EmptyLoop);
        };

        let mut points = vec![first.start()];
        let mut indices = Vec::with_capacity(segments.len());
        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            let start = points.len();
            let end_index = |points: &mut Vec<Point2<f64>>| {
                if i == last {
                    1
                } else {
                    points.push(segment.end());
                    points.len()
                }
            };
            match segment {
                Segment2::Line { .. } => {
                    let end = end_index(&mut points);
                    indices.push(format!("IFCLINEINDEX(({start},{end}))"));
                }
                Segment2::Arc(arc) => {
                    points.push(arc.mid_point());
                    let mid = points.len();
                    let end = end_index(&mut points);
                    indices.push(format!("IFCARCINDEX(({start},{mid},{end}))"));
                }
            }
        }
        let coordinates = points
            .iter()
            .map(|p| Ok(format!("({})", reals(&[p.x, p.y])?)))
            .collect::<Result<Vec<_>>>()?;
        let list = self.add(format!("IFCCARTESIANPOINTLIST2D(({}))", coordinates.join(",")));
        Ok(self.add(format!(
            "IFCINDEXEDPOLYCURVE({list},({}),.F.)",
            indices.join(",")
        )))
    }

    pub fn profile(&mut self, profile: &RecognizedProfile) -> Result<EntityId> {
        let record = match profile {
            RecognizedProfile::Rectangle { position, x_dim, y_dim } => {
                let position = self.placement_2d(position)?;
                format!("IFCRECTANGLEPROFILEDEF(.AREA.,$,{position},{})", reals(&[*x_dim, *y_dim])?)
            }
            RecognizedProfile::Circle { position, radius } => {
                let position = self.placement_2d(position)?;
                format!("IFCCIRCLEPROFILEDEF(.AREA.,$,{position},{})", real(*radius)?)
            }
            RecognizedProfile::HollowCircle { position, radius, wall } => {
                let position = self.placement_2d(position)?;
                format!(
                    "IFCCIRCLEHOLLOWPROFILEDEF(.AREA.,$,{position},{})",
                    reals(&[*radius, *wall])?
                )
            }
            RecognizedProfile::IShape {
                position,
                overall_width,
                overall_depth,
                web_thickness,
                flange_thickness,
                fillet_radius,
            } => {
                let position = self.placement_2d(position)?;
                let fillet = match fillet_radius {
                    Some(r) => real(*r)?,
                    None => "$".to_string(),
                };
                format!(
                    "IFCISHAPEPROFILEDEF(.AREA.,$,{position},{},{fillet},$,$)",
                    reals(&[*overall_width, *overall_depth, *web_thickness, *flange_thickness])?
                )
            }
            RecognizedProfile::Arbitrary { outer, voids } => {
                let outer = self.curve(outer)?;
                if voids.is_empty() {
                    format!("IFCARBITRARYCLOSEDPROFILEDEF(.AREA.,$,{outer})")
                } else {
                    let inner = voids
                        .iter()
                        .map(|v| self.curve(v))
                        .collect::<Result<Vec<_>>>()?;
                    format!(
                        "IFCARBITRARYPROFILEDEFWITHVOIDS(.AREA.,$,{outer},({}))",
                        refs(&inner)
                    )
                }
            }
        };
        Ok(self.add(record))
    }

    pub fn extrusion(&mut self, extrusion: &ExportExtrusion) -> Result<EntityId> {
        let profile = self.profile(&extrusion.profile)?;
        let position = self.placement_3d(&extrusion.position)?;
        let direction = self.direction_3d(&extrusion.direction)?;
        Ok(self.add(format!(
            "IFCEXTRUDEDAREASOLID({profile},{position},{direction},{})",
            real(extrusion.depth)?
        )))
    }

    /// Body representation wrapped in a product shape
    pub fn body(&mut self, items: &[EntityId]) -> Result<EntityId> {
        let context = self.context()?;
        let representation = self.add(format!(
            "IFCSHAPEREPRESENTATION({context},'Body','SweptSolid',({}))",
            refs(items)
        ));
        Ok(self.add(format!("IFCPRODUCTDEFINITIONSHAPE($,$,({representation}))")))
    }

    /// Building element proxy placed at the world origin
    pub fn proxy(&mut self, global_id: &GlobalId, name: &str, shape: Option<EntityId>) -> Result<EntityId> {
        let axes = self.placement_3d(&Frame::world())?;
        let placement = self.add(format!("IFCLOCALPLACEMENT($,{axes})"));
        let shape = shape.map(|id| id.to_string()).unwrap_or_else(|| "$".to_string());
        Ok(self.add(format!(
            "IFCBUILDINGELEMENTPROXY({},$,{},$,$,{placement},{shape},$,$)",
            step_string(&global_id.encode()),
            step_string(name)
        )))
    }

    /// The complete exchange file
    pub fn finish(self) -> String {
        let mut out = String::new();
        out.push_str("ISO-10303-21;\nHEADER;\n");
        out.push_str("FILE_DESCRIPTION(('ViewDefinition [ReferenceView]'),'2;1');\n");
        out.push_str(&format!(
            "FILE_NAME({},{},(''),(''),'ifc-bridge-export','ifc-bridge','');\n",
            step_string(&self.file_name),
            step_string(&self.timestamp)
        ));
        out.push_str(&format!("FILE_SCHEMA(('{SCHEMA}'));\nENDSEC;\n\nDATA;\n"));
        for entity in &self.entities {
            out.push_str(entity);
            out.push('\n');
        }
        out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extrusion::ExtrusionBuilder;
    use approx::assert_relative_eq;
    use ifc_bridge_geometry::{ConicArc, CurveLoop, CurveSegment, Extrusion, Profile, Solid};
    use ifc_bridge_import::{
        ImportOptions, ImportSession, MaterializationDriver, MemorySink, ParameterValue,
    };
    use ifc_bridge_parser::StepStore;

    const PROJECT_ID: &str = "3vB2YO$MX4xv5uCqZZG05x";
    const PROXY_ID: &str = "0vB2YO$MX4xv5uCqZZG05p";

    fn round_trip(extrusion: &Extrusion, name: &str) -> (ExportExtrusion, String, MemorySink) {
        let export = ExtrusionBuilder::default().build(extrusion).unwrap();
        let mut writer = StepWriter::new().with_file_name("round-trip.ifc");
        writer.project(&GlobalId::parse(PROJECT_ID).unwrap(), "P").unwrap();
        let solid = writer.extrusion(&export).unwrap();
        let shape = writer.body(&[solid]).unwrap();
        writer
            .proxy(&GlobalId::parse(PROXY_ID).unwrap(), name, Some(shape))
            .unwrap();
        let content = writer.finish();

        let store = StepStore::parse(content.clone()).unwrap();
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let mut sink = MemorySink::new();
        let summary = MaterializationDriver::new(&mut session, &mut sink).run();
        assert_eq!(summary.failed, 0, "{content}");
        (export, content, sink)
    }

    fn volume(solid: &Solid) -> f64 {
        solid.to_mesh(24, 1e-9).unwrap().volume()
    }

    #[test]
    fn test_real_literals() {
        assert_eq!(real(1.0).unwrap(), "1.");
        assert_eq!(real(-0.25).unwrap(), "-0.25");
        assert_eq!(real(1e-10).unwrap(), "1e-10");
        assert!(matches!(real(f64::NAN), Err(ExportError::NonFinite(_))));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(step_string("O'Brien"), "'O''Brien'");
        assert_eq!(step_string("a\\b"), "'a\\X\\5Cb'");
        assert_eq!(step_string("Stütze"), "'St\\X2\\00FC\\X0\\tze'");
    }

    #[test]
    fn test_file_layout() {
        let mut writer = StepWriter::new().with_timestamp("2024-01-01T00:00:00");
        let point = writer.point_3d(&Point3::new(1.0, 2.0, 0.5)).unwrap();
        assert_eq!(point, EntityId(1));
        let content = writer.finish();
        assert!(content.starts_with("ISO-10303-21;\nHEADER;\n"));
        assert!(content.contains("FILE_SCHEMA(('IFC4'));"));
        assert!(content.contains("#1=IFCCARTESIANPOINT((1.,2.,0.5));"));
        assert!(content.ends_with("END-ISO-10303-21;\n"));
    }

    #[test]
    fn test_rectangle_round_trip() {
        let profile = Profile::rectangle(0.4, 0.2).unwrap();
        let extrusion = Extrusion::new(profile, Vector3::z(), 3.0, 24, 1e-9).unwrap();
        let (export, content, sink) = round_trip(&extrusion, "Column O'Brien");
        assert_eq!(export.profile.kind(), "rectangle");
        assert!(content.contains("IFCRECTANGLEPROFILEDEF(.AREA.,$,"));

        let element = sink.by_global_id(PROXY_ID).unwrap();
        assert_eq!(element.category, "Generic Models");
        assert_eq!(
            element.parameter("IfcName"),
            Some(&ParameterValue::String("Column O'Brien".into()))
        );
        let shape = element.shape.as_ref().unwrap();
        assert_relative_eq!(volume(&shape.solids[0]), 0.24, epsilon = 1e-9);
    }

    #[test]
    fn test_i_shape_round_trip() {
        let profile = Profile::i_shape(0.2, 0.4, 0.01, 0.02, Some(0.015)).unwrap();
        let extrusion = Extrusion::new(profile.clone(), Vector3::z(), 2.0, 24, 1e-9).unwrap();
        let (export, content, sink) = round_trip(&extrusion, "Beam");
        assert_eq!(export.profile.kind(), "I-shape");
        assert!(content.contains("IFCISHAPEPROFILEDEF("));

        let shape = sink.by_global_id(PROXY_ID).unwrap().shape.clone().unwrap();
        let original = Solid::Extrusion(extrusion);
        assert_relative_eq!(volume(&shape.solids[0]), volume(&original), epsilon = 1e-9);
    }

    #[test]
    fn test_arbitrary_profile_with_arc_round_trip() {
        // Half disc: a diameter line closed by a semicircle
        let arc = ConicArc::circular(ifc_bridge_geometry::Frame::world(), 1.0, 0.0, std::f64::consts::PI);
        let outer = CurveLoop::from_segments_unchecked(vec![
            CurveSegment::Arc(arc),
            CurveSegment::line(Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)),
        ]);
        let void = CurveLoop::polyline(
            &[
                Point3::new(-0.2, 0.2, 0.0),
                Point3::new(0.2, 0.2, 0.0),
                Point3::new(0.2, 0.4, 0.0),
                Point3::new(-0.2, 0.2, 0.0),
            ],
            &ifc_bridge_geometry::Tolerance::new(1e-9),
        )
        .unwrap();
        let profile = Profile::new(outer).with_inner(void);
        let extrusion = Extrusion::new(profile, Vector3::z(), 1.0, 24, 1e-9).unwrap();
        let (export, content, sink) = round_trip(&extrusion, "Half disc");
        assert_eq!(export.profile.kind(), "arbitrary");
        assert!(content.contains("IFCARBITRARYPROFILEDEFWITHVOIDS("));
        assert!(content.contains("IFCARCINDEX(("));

        let shape = sink.by_global_id(PROXY_ID).unwrap().shape.clone().unwrap();
        let expected = std::f64::consts::PI / 2.0 - 0.04;
        assert_relative_eq!(volume(&shape.solids[0]), expected, epsilon = 0.03);
    }

    #[test]
    fn test_annulus_round_trip() {
        let profile = Profile::hollow_circle(0.1, 0.01).unwrap();
        let extrusion = Extrusion::new(profile, Vector3::z(), 1.0, 24, 1e-9).unwrap();
        let (export, content, sink) = round_trip(&extrusion, "Pipe");
        assert_eq!(export.profile.kind(), "hollow circle");
        assert!(content.contains("IFCCIRCLEHOLLOWPROFILEDEF("));
        let element = sink.by_global_id(PROXY_ID).unwrap();
        assert_eq!(element.solids, 1);
    }
}
