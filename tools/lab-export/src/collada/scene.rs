//! `<library_visual_scenes>`: joint hierarchy, dummies and skin instance

use lab_common::SkeletalAsset;

use super::document::ColladaWriter;
use super::names::NameTable;
use super::{CONTROLLER_ID, SerializationError};

/// Depth-first walk events; keeps deep chains off the call stack
enum Visit {
    Enter(u32),
    Exit,
}

pub(crate) fn write_visual_scenes(
    w: &mut ColladaWriter,
    asset: &SkeletalAsset,
    names: &NameTable,
) -> Result<(), SerializationError> {
    let children = asset.child_indices();
    let roots: Vec<u32> = asset.root_bones().map(|b| b.index).collect();

    w.start("library_visual_scenes");
    w.start("visual_scene");
    w.attr("id", "Scene");
    w.attr("name", "Scene");

    w.start("node");
    w.attr("id", "Skeleton");
    w.attr("name", "Skeleton");
    w.attr("type", "NODE");

    let mut stack: Vec<Visit> = roots.iter().rev().map(|&i| Visit::Enter(i)).collect();
    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(index) => {
                write_joint_open(w, asset, names, index)?;
                stack.push(Visit::Exit);
                if let Some(kids) = children.get(index as usize) {
                    stack.extend(kids.iter().rev().map(|&i| Visit::Enter(i)));
                }
            }
            Visit::Exit => w.end(),
        }
    }
    w.end(); // Skeleton

    if asset.mesh.is_some() {
        w.start("node");
        w.attr("id", "Skin");
        w.attr("name", "Skin");
        w.attr("type", "NODE");
        w.start("instance_controller");
        w.attr("url", &format!("#{}", CONTROLLER_ID));
        for &root in &roots {
            let id = names.joint(root).ok_or_else(|| missing_joint(root))?;
            w.leaf("skeleton", &format!("#{}", id));
        }
        w.end();
        w.end();
    }

    w.end(); // visual_scene
    w.end();
    Ok(())
}

/// Open a joint node and write its matrix and dummies. The caller closes it
/// after the children.
fn write_joint_open(
    w: &mut ColladaWriter,
    asset: &SkeletalAsset,
    names: &NameTable,
    index: u32,
) -> Result<(), SerializationError> {
    let bone = asset.bone(index).ok_or_else(|| missing_joint(index))?;
    let id = names.joint(index).ok_or_else(|| missing_joint(index))?;

    w.start("node");
    w.attr("id", id);
    w.attr("sid", id);
    w.attr_text("name", &bone.name);
    w.attr("type", "JOINT");
    w.matrix("transform", &bone.local_bind_transform.to_matrix());

    for (position, dummy) in asset.dummies_of(index) {
        let dummy_id = names.dummy(position).ok_or_else(|| {
            SerializationError::Internal(format!("no id for dummy {}", dummy.id))
        })?;
        w.start("node");
        w.attr("id", dummy_id);
        w.attr("name", &format!("Dummy {}", dummy.id));
        w.attr("type", "NODE");
        w.matrix("transform", &dummy.transform.to_matrix());
        w.end();
    }
    Ok(())
}

fn missing_joint(index: u32) -> SerializationError {
    SerializationError::Internal(format!("no joint for bone {}", index))
}
