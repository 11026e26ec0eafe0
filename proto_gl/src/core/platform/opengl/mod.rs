mod opengl_render_backend;
