pub mod shared {
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod pixel_rect;
    pub mod scratch_dir;
    pub mod video_metadata;
}

pub mod detection {
    pub mod domain {
        pub mod detection;
        pub mod detection_index;
        pub mod face_detection_source;
    }
    pub mod infrastructure;
}

pub mod redaction {
    pub mod domain {
        pub mod bounding_box_mapper;
        pub mod region_redactor;
        pub mod temporal_window;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod video_reader;
        pub mod video_store;
        pub mod video_writer;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod infrastructure;
    pub mod pipeline_executor;
    pub mod pipeline_logger;
    pub mod redact_video_use_case;
    pub mod redaction_config;
    pub mod redaction_engine;
    pub mod redaction_report;
}
