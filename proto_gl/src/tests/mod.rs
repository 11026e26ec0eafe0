mod test_camera;
mod test_object;
