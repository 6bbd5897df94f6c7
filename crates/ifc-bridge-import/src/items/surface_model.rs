// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shell- and face-based surface models; every shell stands on its own

use super::brep::{add_shell_faces, finish_scope};
use super::GeometrySet;
use crate::error::{ImportError, Result};
use crate::session::ImportSession;
use ifc_bridge_geometry::FaceSetScope;
use ifc_bridge_model::{DecodedEntity, IfcType};

pub(super) fn build(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    let attribute = match record.ifc_type {
        IfcType::IfcShellBasedSurfaceModel => "SbsmBoundary",
        _ => "FbsmFaces",
    };
    let shells = record.refs_attr(attribute);
    let mut set = GeometrySet::default();
    for shell_id in shells.iter().copied() {
        let shell = match session.record(shell_id) {
            Ok(shell) => shell,
            Err(err) => {
                session.warn(record.id, format!("shell skipped: {err}"));
                continue;
            }
        };
        let closed = shell.ifc_type == IfcType::IfcClosedShell;
        let declared = shell.refs_attr("CfsFaces").len();
        let mut scope = FaceSetScope::begin(declared, closed, session.tolerance().vertex);
        add_shell_faces(session, &mut scope, &shell, false);
        match finish_scope(session, shell_id, scope) {
            Ok(solid) => set.solids.push(solid),
            Err(err) => session.warn(record.id, format!("shell {shell_id} skipped: {err}")),
        }
    }
    if set.solids.is_empty() {
        return Err(ImportError::invalid(
            record.id,
            attribute,
            format!("none of {} shells produced geometry", shells.len()),
        ));
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::store;
    use crate::options::ImportOptions;
    use crate::session::ImportSession;
    use ifc_bridge_geometry::Solid;
    use ifc_bridge_model::EntityId;

    #[test]
    fn test_bad_shell_does_not_abort_the_others() {
        let store = store(
            "#2=IFCCARTESIANPOINT((0.,0.,0.));
#3=IFCCARTESIANPOINT((1.,0.,0.));
#4=IFCCARTESIANPOINT((1.,1.,0.));
#5=IFCPOLYLOOP((#2,#3,#4));
#6=IFCFACEOUTERBOUND(#5,.T.);
#7=IFCFACE((#6));
#8=IFCOPENSHELL((#7));
#9=IFCPOLYLOOP((#2,#3,#2));
#10=IFCFACEOUTERBOUND(#9,.T.);
#11=IFCFACE((#10));
#12=IFCOPENSHELL((#11));
#13=IFCSHELLBASEDSURFACEMODEL((#12,#8));",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(13))).unwrap();
        assert_eq!(set.solids.len(), 1);
        assert!(matches!(&set.solids[0], Solid::Brep(shell) if !shell.closed));
        assert!(session
            .diagnostics()
            .for_entity(EntityId(13))
            .any(|d| d.message.contains("shell #12 skipped")));
    }

    #[test]
    fn test_face_based_model() {
        let store = store(
            "#2=IFCCARTESIANPOINT((0.,0.,0.));
#3=IFCCARTESIANPOINT((1.,0.,0.));
#4=IFCCARTESIANPOINT((1.,1.,0.));
#5=IFCPOLYLOOP((#2,#3,#4));
#6=IFCFACEBOUND(#5,.T.);
#7=IFCFACE((#6));
#8=IFCCONNECTEDFACESET((#7));
#9=IFCFACEBASEDSURFACEMODEL((#8));",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(9))).unwrap();
        let mesh = set.solids[0].to_mesh(24, 1e-9).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
    }
}
