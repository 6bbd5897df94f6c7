// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::GeometrySet;
use crate::entity::EntityClass;
use crate::error::{ImportError, Result};
use crate::session::ImportSession;
use ifc_bridge_model::DecodedEntity;

/// Mapped item: the shared representation placed by target × origin
pub(super) fn build(session: &mut ImportSession<'_>, record: &DecodedEntity) -> Result<GeometrySet> {
    let source_id = record
        .ref_attr("MappingSource")
        .ok_or_else(|| ImportError::null(record.id, "MappingSource"))?;
    let map = session
        .process(Some(source_id), EntityClass::RepresentationMap)
        .and_then(|h| session.entity(h).representation_map.clone())
        .ok_or_else(|| ImportError::invalid(record.id, "MappingSource", "unresolved representation map"))?;
    let target = session.optional_placement(record.ref_attr("MappingTarget"));

    let items = session
        .entity(map.representation)
        .representation
        .as_ref()
        .map(|rep| rep.items.clone())
        .unwrap_or_default();
    let mut set = GeometrySet::default();
    for item in items {
        if let Some(geometry) = session.geometry_of(item) {
            set.extend(geometry);
        }
    }
    if set.is_empty() {
        return Err(ImportError::invalid(record.id, "MappingSource", "mapped representation is empty"));
    }
    Ok(set.transformed(&(target * map.origin)))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::store;
    use crate::options::ImportOptions;
    use crate::session::ImportSession;
    use approx::assert_relative_eq;
    use ifc_bridge_model::EntityId;

    #[test]
    fn test_target_and_origin_compose() {
        let store = store(
            "#2=IFCCARTESIANPOINT((0.,0.,0.));
#3=IFCAXIS2PLACEMENT3D(#2,$,$);
#4=IFCBLOCK(#3,1.,1.,1.);
#5=IFCSHAPEREPRESENTATION($,'Body','CSG',(#4));
#6=IFCCARTESIANPOINT((0.,0.,5.));
#7=IFCAXIS2PLACEMENT3D(#6,$,$);
#8=IFCREPRESENTATIONMAP(#7,#5);
#9=IFCCARTESIANPOINT((10.,0.,0.));
#10=IFCCARTESIANTRANSFORMATIONOPERATOR3D($,$,#9,2.,$);
#11=IFCMAPPEDITEM(#8,#10);",
        );
        let mut session = ImportSession::new(&store, ImportOptions::default()).unwrap();
        let set = session.item_geometry(Some(EntityId(11))).unwrap();
        let (min, max) = set.solids[0].to_mesh(24, 1e-9).unwrap().bounds().unwrap();
        assert_relative_eq!(min.x, 10.0, epsilon = 1e-5);
        assert_relative_eq!(min.z, 10.0, epsilon = 1e-5);
        assert_relative_eq!(max.z, 12.0, epsilon = 1e-5);
    }
}
