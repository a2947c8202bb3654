pub mod shared {
    pub mod annotation;
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod model_resolver;
    pub mod rect;
    pub mod settings;
}

pub mod detection {
    pub mod domain {
        pub mod candidate_matcher;
        pub mod face_comparator;
        pub mod face_detector;
        pub mod object_detector;
    }
    pub mod infrastructure;
}

pub mod candidates {
    pub mod candidate_set;
    pub mod ranked_queue;
    pub mod similarity_ranker;
}

pub mod workflow {
    pub mod confirmation_workflow;
}

pub mod redaction {
    pub mod domain {
        pub mod feather_mask;
        pub mod region_redactor;
        pub mod square_crop;
        pub mod transparency_mask;
    }
    pub mod infrastructure;
}

pub mod media {
    pub mod domain {
        pub mod image_reader;
        pub mod image_writer;
    }
    pub mod infrastructure {
        pub mod image_file_reader;
        pub mod image_file_writer;
    }
}

pub mod pipeline {
    pub mod opt_out_session;
    pub mod redact_image_use_case;
}
