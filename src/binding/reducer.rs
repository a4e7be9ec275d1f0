use std::sync::mpsc;

use crate::binding::edit::Edit;
use crate::binding::fonts::{
    FontEvent, FontOutcome, FontRegistry, FontRequest, FontRequestToken, FontService,
};
use crate::binding::panel::ControlPanel;
use crate::foundation::core::{Point, Vec2};
use crate::foundation::error::{StageError, StageResult};
use crate::reconstruct::{FrameKind, align_center};
use crate::scene::{Camera, Compositor, LayerBinding, SceneState};

/// Everything an edit may touch, borrowed from the session for one reduction.
pub struct EditTarget<'a> {
    pub scene: &'a mut SceneState,
    pub compositor: &'a mut Compositor,
    pub panel: &'a mut ControlPanel,
    pub fonts: &'a mut FontRegistry,
    pub font_service: &'a dyn FontService,
    pub font_events: &'a mpsc::Sender<FontEvent>,
    pub camera: &'a Camera,
}

/// What happened to an edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The scene reflects the edit.
    Applied,
    /// The family is being fetched; it is applied when the request settles.
    FontPending(FontRequestToken),
}

/// Apply one control change: update the render object and the instance, refresh the section,
/// then redraw once.
#[tracing::instrument(skip(target, edit), fields(field = edit.field_name()))]
pub fn apply_edit(
    target: &mut EditTarget<'_>,
    key: &str,
    edit: Edit,
) -> StageResult<EditOutcome> {
    let binding = target
        .scene
        .binding(key)
        .cloned()
        .ok_or_else(|| StageError::validation(format!("no control section '{key}'")))?;
    if !edit.applies_to(binding.kind) {
        return Err(StageError::validation(format!(
            "control '{}' does not exist on {:?} section '{key}'",
            edit.field_name(),
            binding.kind
        )));
    }
    check_value(&edit)?;

    let outcome = match edit {
        Edit::FontFamily(family) => {
            if target.fonts.is_loaded(&family) {
                target.fonts.forget(&binding.instance_id);
                set_family(target, &binding, &family)?;
                EditOutcome::Applied
            } else {
                EditOutcome::FontPending(request_font(target, &binding.instance_id, &family))
            }
        }
        other => {
            mutate_object(target, &binding, other)?;
            EditOutcome::Applied
        }
    };

    finish(target, key)?;
    target.compositor.request_render(target.camera)?;
    Ok(outcome)
}

/// Ask for `family` on behalf of an instance; dispatches only if nobody else already did.
pub fn request_font(
    target: &mut EditTarget<'_>,
    instance_id: &str,
    family: &str,
) -> FontRequestToken {
    let (token, dispatch) = target.fonts.begin(instance_id, family);
    if dispatch {
        tracing::debug!(family, ?token, "requesting font");
        target.font_service.load(
            FontRequest {
                family: family.to_owned(),
                token,
            },
            target.font_events.clone(),
        );
    }
    token
}

/// Apply a font completion to every instance still waiting for that family.
///
/// Active fonts are registered with the surface first. Inactive families are applied anyway, so
/// the text renders with the default face. Returns how many instances were updated.
pub fn settle_font(target: &mut EditTarget<'_>, event: FontEvent) -> StageResult<usize> {
    let FontEvent {
        family,
        token,
        outcome,
    } = event;
    let active = match outcome {
        FontOutcome::Active(bytes) => match target.compositor.register_font(&family, bytes) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%family, %err, "font bytes rejected; applying by name");
                false
            }
        },
        FontOutcome::Inactive(reason) => {
            tracing::warn!(%family, %reason, "font inactive; applying by name");
            false
        }
    };

    let settled = target.fonts.settle(&family, active);
    tracing::debug!(%family, ?token, active, instances = settled.len(), "font settled");
    let mut applied = 0;
    for (instance_id, _) in settled {
        let Some(binding) = target.scene.binding_for_instance(&instance_id).cloned() else {
            continue;
        };
        set_family(target, &binding, &family)?;
        finish(target, &binding.key)?;
        applied += 1;
    }
    if applied > 0 {
        target.compositor.request_render(target.camera)?;
    }
    Ok(applied)
}

fn check_value(edit: &Edit) -> StageResult<()> {
    match edit {
        Edit::PercentX(v) | Edit::PercentY(v) | Edit::X(v) | Edit::Y(v) if !v.is_finite() => Err(
            StageError::validation(format!("'{}' must be finite", edit.field_name())),
        ),
        Edit::ScaleX(v) | Edit::ScaleY(v) if !v.is_finite() || *v == 0.0 => Err(
            StageError::validation(format!("'{}' must be finite and non-zero", edit.field_name())),
        ),
        Edit::FontSize(0) => Err(StageError::validation("'font_size' must be at least 1")),
        _ => Ok(()),
    }
}

fn mutate_object(
    target: &mut EditTarget<'_>,
    binding: &LayerBinding,
    edit: Edit,
) -> StageResult<()> {
    let object = target
        .compositor
        .get_mut(&binding.frame_id)
        .ok_or_else(|| missing_object(binding))?;
    let pos = object.position();
    let scale = object.scale();
    let mut reflow = false;

    match edit {
        Edit::PercentX(v) => {
            let x = f64::from(binding.doc.width) / 100.0 * v
                - f64::from(binding.width) / 2.0 * scale.x;
            object.set_position(Point::new(x, pos.y));
            set_percent(target.scene, &binding.key, |p| p.x = v);
        }
        Edit::PercentY(v) => {
            let y = f64::from(binding.doc.height) / 100.0 * v
                - f64::from(binding.height) / 2.0 * scale.y;
            object.set_position(Point::new(pos.x, y));
            set_percent(target.scene, &binding.key, |p| p.y = v);
        }
        Edit::X(v) => object.set_position(Point::new(v, pos.y)),
        Edit::Y(v) => object.set_position(Point::new(pos.x, v)),
        Edit::ScaleX(v) => {
            object.set_scale(Vec2::new(v, scale.y));
            reflow = binding.kind == FrameKind::Text;
        }
        Edit::ScaleY(v) => object.set_scale(Vec2::new(scale.x, v)),
        Edit::Text(text) => {
            let node = object.as_text_mut().ok_or_else(|| not_text(binding))?;
            node.text = text;
            reflow = true;
        }
        Edit::Color(color) => {
            let node = object.as_text_mut().ok_or_else(|| not_text(binding))?;
            node.color = color;
        }
        Edit::FontSize(size) => {
            let node = object.as_text_mut().ok_or_else(|| not_text(binding))?;
            node.font = node.font.with_size(size);
            reflow = true;
        }
        Edit::FontFamily(_) => {
            return Err(StageError::validation(
                "font family changes go through the font registry",
            ));
        }
    }

    if reflow {
        recenter_text(target.compositor, binding)?;
    }
    Ok(())
}

fn set_family(
    target: &mut EditTarget<'_>,
    binding: &LayerBinding,
    family: &str,
) -> StageResult<()> {
    let node = target
        .compositor
        .get_mut(&binding.frame_id)
        .ok_or_else(|| missing_object(binding))?
        .as_text_mut()
        .ok_or_else(|| not_text(binding))?;
    node.font = node.font.with_family(family);
    recenter_text(target.compositor, binding)
}

/// Keep a centered text run centered after its measured width changed.
pub(crate) fn recenter_text(
    compositor: &mut Compositor,
    binding: &LayerBinding,
) -> StageResult<()> {
    if !binding.centered {
        return Ok(());
    }
    let node = compositor
        .get(&binding.frame_id)
        .and_then(|o| o.as_text())
        .cloned()
        .ok_or_else(|| not_text(binding))?;
    let measured = compositor.measure_text(&node) * node.scale.x;
    let x = align_center(f64::from(binding.doc.width), measured);
    if let Some(object) = compositor.get_mut(&binding.frame_id) {
        let y = object.position().y;
        object.set_position(Point::new(x, y));
    }
    Ok(())
}

fn set_percent(scene: &mut SceneState, key: &str, f: impl FnOnce(&mut Point)) {
    if let Some(b) = scene.binding_mut(key) {
        f(&mut b.percent);
    }
}

/// Copy the object's state into the instance and the section.
fn finish(target: &mut EditTarget<'_>, key: &str) -> StageResult<()> {
    let binding = target
        .scene
        .binding(key)
        .cloned()
        .ok_or_else(|| StageError::validation(format!("no control section '{key}'")))?;
    let object = target
        .compositor
        .get(&binding.frame_id)
        .ok_or_else(|| missing_object(&binding))?;

    if let Some(instance) = target.scene.instance_mut(&binding.instance_id) {
        let s = object.scale();
        instance.scale_x = s.x;
        instance.scale_y = s.y;
        instance.width = f64::from(binding.width) * s.x;
        instance.height = f64::from(binding.height) * s.y;
        if let (Some(state), Some(node)) = (instance.text.as_mut(), object.as_text()) {
            state.text.clone_from(&node.text);
            state.font_family.clone_from(&node.font.family);
            state.font_size = node.font.size_px;
            state.color = node.color;
        }
    }
    target.panel.refresh(&binding, object);
    Ok(())
}

fn missing_object(binding: &LayerBinding) -> StageError {
    StageError::validation(format!(
        "section '{}' has no render object '{}'",
        binding.key, binding.frame_id
    ))
}

fn not_text(binding: &LayerBinding) -> StageError {
    StageError::validation(format!("section '{}' is not a text layer", binding.key))
}

#[cfg(test)]
#[path = "../../tests/unit/binding/reducer.rs"]
mod tests;
