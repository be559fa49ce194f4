use pano_sphere::mesh::{self, U16_VERTEX_LIMIT};
use pano_sphere::{Frame, IndexFormat, Mesh, PanoError, RenderBackend, ViewMode, ViewModel};
use std::f32::consts::FRAC_PI_2;

/// Backend that keeps what it was given instead of talking to a GPU.
#[derive(Default)]
struct RecordingBackend {
    uploads: Vec<(usize, usize, IndexFormat)>,
    frames: Vec<Frame>,
}

impl RenderBackend for RecordingBackend {
    type Error = PanoError;

    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<(), PanoError> {
        if mesh.index_format() == IndexFormat::U16 {
            mesh.indices_u16()?;
        }
        self.uploads
            .push((mesh.vertex_count(), mesh.index_count(), mesh.index_format()));
        Ok(())
    }

    fn bind_frame(&mut self, frame: &Frame) -> Result<(), PanoError> {
        self.frames.push(*frame);
        Ok(())
    }
}

#[test]
fn test_drag_and_mode_switch_session() {
    let mut backend = RecordingBackend::default();
    backend.upload_mesh(&mesh::generate(200, 1.0).unwrap()).unwrap();
    assert_eq!(backend.uploads, vec![(101 * 201, 100 * 200 * 6, IndexFormat::U16)]);

    let mut vm = ViewModel::new(ViewMode::Sphere);
    let render = |vm: &ViewModel, backend: &mut RecordingBackend| {
        let frame = Frame::capture(vm, 1280, 720).unwrap();
        backend.bind_frame(&frame).unwrap();
    };

    render(&vm, &mut backend);
    for _ in 0..30 {
        vm.apply_drag(4.0, 60.0);
        render(&vm, &mut backend);
    }
    assert_eq!(vm.rotation().x_axis_rotate, FRAC_PI_2);
    assert!(backend.frames.iter().all(|f| f.cull_back_faces));
    assert_ne!(backend.frames[0].view, backend.frames[30].view);

    vm.set_mode(ViewMode::Asteroid);
    render(&vm, &mut backend);
    vm.apply_drag(-50.0, 50.0);
    render(&vm, &mut backend);
    let n = backend.frames.len();
    assert!(!backend.frames[n - 1].cull_back_faces);
    // 小行星视图不随拖拽变化
    assert_eq!(backend.frames[n - 2].view, backend.frames[n - 1].view);
    assert!((vm.rotation().x_axis_rotate + 0.3).abs() < 1e-6);
}

#[test]
fn test_retessellation_widens_indices() {
    let mut backend = RecordingBackend::default();
    for slices in [64, 360, 400] {
        backend.upload_mesh(&mesh::generate(slices, 1.0).unwrap()).unwrap();
    }
    let formats: Vec<_> = backend.uploads.iter().map(|u| u.2).collect();
    assert_eq!(formats, vec![IndexFormat::U16, IndexFormat::U16, IndexFormat::U32]);
    assert!(backend.uploads[2].0 > U16_VERTEX_LIMIT);
}

#[test]
fn test_mesh_shared_across_threads() {
    let sphere = std::sync::Arc::new(mesh::generate(32, 1.0).unwrap());
    let worker = {
        let sphere = sphere.clone();
        std::thread::spawn(move || sphere.indices().iter().copied().max())
    };
    let max = worker.join().unwrap().unwrap();
    assert_eq!(max as usize, sphere.vertex_count() - 1);
}
