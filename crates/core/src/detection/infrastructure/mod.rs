pub mod coco_labels;
pub mod execution_provider;
pub mod model_loader;
pub mod model_resolver;
pub mod onnx_yolo_detector;
pub mod threaded_inference_service;
