//! Per-frame command sequence, independent of the device that executes it.

use crate::scene::{Camera, ObjectConstants, Scene, CUBE_INDEX_COUNT};

/// Commands one frame needs from the device.
///
/// All objects share one constant buffer. Each upload overwrites the last and
/// is consumed by the draw that follows it, so calls must execute in order.
pub trait FrameTarget {
    fn clear(&mut self, color: [f32; 4]);
    fn upload_object_constants(&mut self, constants: &ObjectConstants);
    /// Binds the constant buffer, texture and sampler for the next draw.
    fn bind_object_resources(&mut self);
    fn draw_indexed(&mut self, index_count: u32);
    fn present(&mut self, sync_interval: u32);
}

/// Records one frame: clear, draw each cube in order, present.
pub fn render_frame(
    target: &mut impl FrameTarget,
    scene: &Scene,
    camera: &Camera,
    clear_color: [f32; 4],
    sync_interval: u32,
) {
    target.clear(clear_color);

    let view_projection = camera.view_projection();
    for world in scene.worlds() {
        target.upload_object_constants(&ObjectConstants::new(world, view_projection));
        target.bind_object_resources();
        target.draw_indexed(CUBE_INDEX_COUNT);
    }

    target.present(sync_interval);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[derive(Debug, Clone, PartialEq)]
    enum Command {
        Clear([f32; 4]),
        Upload(ObjectConstants),
        Bind,
        Draw(u32),
        Present(u32),
    }

    #[derive(Default)]
    struct Recorder {
        commands: Vec<Command>,
    }

    impl FrameTarget for Recorder {
        fn clear(&mut self, color: [f32; 4]) {
            self.commands.push(Command::Clear(color));
        }

        fn upload_object_constants(&mut self, constants: &ObjectConstants) {
            self.commands.push(Command::Upload(*constants));
        }

        fn bind_object_resources(&mut self) {
            self.commands.push(Command::Bind);
        }

        fn draw_indexed(&mut self, index_count: u32) {
            self.commands.push(Command::Draw(index_count));
        }

        fn present(&mut self, sync_interval: u32) {
            self.commands.push(Command::Present(sync_interval));
        }
    }

    fn scene_and_camera() -> (Scene, Camera) {
        let mut scene = Scene::new(0.01, 0.0005);
        scene.update();
        let camera = Camera::new(&Settings::from_client_size((1440, 1080), false, false));
        (scene, camera)
    }

    #[test]
    fn frame_is_clear_two_draws_then_present() {
        let (scene, camera) = scene_and_camera();
        let mut recorder = Recorder::default();

        render_frame(&mut recorder, &scene, &camera, [1.0, 0.0, 1.0, 1.0], 0);

        let [cube1, cube2] = scene.worlds();
        let view_projection = camera.view_projection();
        assert_eq!(
            recorder.commands,
            vec![
                Command::Clear([1.0, 0.0, 1.0, 1.0]),
                Command::Upload(ObjectConstants::new(cube1, view_projection)),
                Command::Bind,
                Command::Draw(36),
                Command::Upload(ObjectConstants::new(cube2, view_projection)),
                Command::Bind,
                Command::Draw(36),
                Command::Present(0),
            ]
        );
    }

    #[test]
    fn present_follows_both_constant_uploads() {
        let (scene, camera) = scene_and_camera();
        let mut recorder = Recorder::default();

        for _ in 0..3 {
            render_frame(&mut recorder, &scene, &camera, [0.0; 4], 1);
        }

        let mut uploads_since_present = 0;
        for command in &recorder.commands {
            match command {
                Command::Upload(_) => uploads_since_present += 1,
                Command::Present(interval) => {
                    assert_eq!(uploads_since_present, 2);
                    assert_eq!(*interval, 1);
                    uploads_since_present = 0;
                }
                _ => {}
            }
        }
    }

    #[test]
    fn each_draw_uses_the_upload_immediately_before_it() {
        let (scene, camera) = scene_and_camera();
        let mut recorder = Recorder::default();
        render_frame(&mut recorder, &scene, &camera, [0.0; 4], 0);

        let mut current = None;
        let mut drawn = Vec::new();
        for command in &recorder.commands {
            match command {
                Command::Upload(constants) => current = Some(*constants),
                Command::Draw(_) => drawn.push(current.take().expect("draw without upload")),
                _ => {}
            }
        }

        assert_eq!(drawn.len(), 2);
        assert_ne!(drawn[0], drawn[1]);
    }
}
