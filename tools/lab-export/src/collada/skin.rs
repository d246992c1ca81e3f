//! `<library_geometries>` and `<library_controllers>` for the skinned mesh

use lab_common::{MeshData, SkeletalAsset};

use super::document::{ColladaWriter, row_major};
use super::names::NameTable;
use super::{CONTROLLER_ID, GEOMETRY_ID, SerializationError};

const XYZ: [(&str, &str); 3] = [("X", "float"), ("Y", "float"), ("Z", "float")];

pub(crate) fn write_geometry(w: &mut ColladaWriter, mesh: &MeshData) {
    let positions: Vec<f32> = mesh.positions.iter().flat_map(|p| p.to_array()).collect();
    let normals: Vec<f32> = mesh.normals.iter().flat_map(|n| n.to_array()).collect();
    let positions_id = format!("{}-positions", GEOMETRY_ID);
    let normals_id = format!("{}-normals", GEOMETRY_ID);
    let vertices_id = format!("{}-vertices", GEOMETRY_ID);

    w.start("library_geometries");
    w.start("geometry");
    w.attr("id", GEOMETRY_ID);
    w.attr("name", "Mesh");
    w.start("mesh");

    w.float_source(&positions_id, &positions, 3, &XYZ);
    w.float_source(&normals_id, &normals, 3, &XYZ);

    w.start("vertices");
    w.attr("id", &vertices_id);
    w.input("POSITION", &positions_id, None);
    w.end();

    w.start("triangles");
    w.attr("count", &mesh.triangle_count());
    w.input("VERTEX", &vertices_id, Some(0));
    w.input("NORMAL", &normals_id, Some(0));
    w.list("p", &mesh.indices);
    w.end();

    w.end(); // mesh
    w.end(); // geometry
    w.end();
}

/// Skin controller binding the mesh to every joint.
///
/// Inverse bind matrices are the inverses of the absolute bind transforms,
/// indexed like the joint list.
pub(crate) fn write_controller(
    w: &mut ColladaWriter,
    asset: &SkeletalAsset,
    mesh: &MeshData,
    names: &NameTable,
) -> Result<(), SerializationError> {
    let joints: Vec<&str> = names.joints().collect();
    if joints.len() != asset.bones.len() {
        return Err(SerializationError::Internal(format!(
            "{} joint ids for {} bones",
            joints.len(),
            asset.bones.len()
        )));
    }

    let mut bind_poses = Vec::with_capacity(joints.len() * 16);
    for (index, matrix) in asset.inverse_bind_matrices().iter().enumerate() {
        if !matrix.is_finite() {
            return Err(SerializationError::Internal(format!(
                "bone {} bind pose is not invertible",
                index
            )));
        }
        bind_poses.extend(row_major(matrix));
    }

    // Flattened influences: weights array plus (joint, weight index) pairs
    let mut weights = Vec::new();
    let mut vcount = Vec::with_capacity(mesh.weights.len());
    let mut v = Vec::new();
    for (vertex, vertex_weights) in mesh.weights.iter().enumerate() {
        let mut influences = 0;
        for (bone, weight) in vertex_weights.influences() {
            if bone as usize >= joints.len() {
                return Err(SerializationError::Internal(format!(
                    "vertex {} is weighted to missing bone {}",
                    vertex, bone
                )));
            }
            v.push(bone);
            v.push(weights.len() as u32);
            weights.push(weight);
            influences += 1;
        }
        vcount.push(influences);
    }

    let skin_joints = format!("{}-joints", CONTROLLER_ID);
    let skin_bind_poses = format!("{}-bind_poses", CONTROLLER_ID);
    let skin_weights = format!("{}-weights", CONTROLLER_ID);

    w.start("library_controllers");
    w.start("controller");
    w.attr("id", CONTROLLER_ID);
    w.attr("name", "Skin");
    w.start("skin");
    w.attr("source", &format!("#{}", GEOMETRY_ID));
    w.list("bind_shape_matrix", row_major(&glam::Mat4::IDENTITY));

    w.name_source(&skin_joints, &joints, ("JOINT", "name"));
    w.float_source(
        &skin_bind_poses,
        &bind_poses,
        16,
        &[("TRANSFORM", "float4x4")],
    );
    w.float_source(&skin_weights, &weights, 1, &[("WEIGHT", "float")]);

    w.start("joints");
    w.input("JOINT", &skin_joints, None);
    w.input("INV_BIND_MATRIX", &skin_bind_poses, None);
    w.end();

    w.start("vertex_weights");
    w.attr("count", &mesh.weights.len());
    w.input("JOINT", &skin_joints, Some(0));
    w.input("WEIGHT", &skin_weights, Some(1));
    w.list("vcount", &vcount);
    w.list("v", &v);
    w.end();

    w.end(); // skin
    w.end(); // controller
    w.end();
    Ok(())
}
