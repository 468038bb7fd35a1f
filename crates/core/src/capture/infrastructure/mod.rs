pub mod camera_devices;
pub mod ffmpeg_camera;
pub mod latest_frame;
