pub mod predict_faces_use_case;
pub mod upload_validator;
