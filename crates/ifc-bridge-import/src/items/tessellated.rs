// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangulated face sets

use super::GeometrySet;
use crate::error::{ImportError, Result};
use crate::session::ImportSession;
use ifc_bridge_geometry::{Mesh, Point3, Solid};
use ifc_bridge_model::{AttributeValue, DecodedEntity};

fn index_list(value: &AttributeValue) -> Option<Vec<i64>> {
    value.as_list()?.iter().map(AttributeValue::as_integer).collect()
}

pub(super) fn build(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    let coordinates = session.record_attr(record, "Coordinates")?;
    let points: Vec<Point3<f64>> = coordinates
        .list_attr("CoordList")
        .ok_or_else(|| ImportError::invalid(coordinates.id, "CoordList", "not a list"))?
        .iter()
        .map(|p| {
            let c = p.as_float_list().filter(|c| c.len() == 3)?;
            Some(Point3::new(session.length(c[0]), session.length(c[1]), session.length(c[2])))
        })
        .collect::<Option<_>>()
        .ok_or_else(|| ImportError::invalid(coordinates.id, "CoordList", "expected 3D coordinates"))?;

    // PnIndex, when present, is an extra indirection into the point list
    let pn_index = record.attribute("PnIndex").and_then(index_list);
    let resolve = |i: i64| -> Option<usize> {
        let i = match &pn_index {
            Some(pn) => *pn.get(usize::try_from(i - 1).ok()?)?,
            None => i,
        };
        let i = usize::try_from(i - 1).ok()?;
        (i < points.len()).then_some(i)
    };

    let triangles = record
        .list_attr("CoordIndex")
        .ok_or_else(|| ImportError::invalid(record.id, "CoordIndex", "not a list"))?;
    let tolerance = session.tolerance().vertex;
    let mut mesh = Mesh::new();
    let mut skipped = 0usize;
    for triangle in triangles {
        let corners = index_list(triangle)
            .filter(|t| t.len() == 3)
            .and_then(|t| t.into_iter().map(resolve).collect::<Option<Vec<_>>>());
        let Some(corners) = corners else {
            skipped += 1;
            continue;
        };
        let (a, b, c) = (points[corners[0]], points[corners[1]], points[corners[2]]);
        let normal = (b - a).cross(&(c - a));
        let Some(normal) = normal.try_normalize(tolerance * tolerance) else {
            skipped += 1;
            continue;
        };
        let i = mesh.add_vertex(&a, &normal);
        mesh.add_vertex(&b, &normal);
        mesh.add_vertex(&c, &normal);
        mesh.add_triangle(i, i + 1, i + 2);
    }
    if skipped > 0 {
        session.warn(
            record.id,
            format!("{skipped} of {} triangles skipped as invalid", triangles.len()),
        );
    }
    if mesh.is_empty() {
        return Err(ImportError::invalid(record.id, "CoordIndex", "no valid triangles"));
    }
    Ok(GeometrySet::from_solid(Solid::Mesh(mesh)))
}
