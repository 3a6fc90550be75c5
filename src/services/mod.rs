pub mod activity_service;
pub mod image_description_service;
pub mod image_service;
pub mod itinerary_flow;
pub mod itinerary_generation_service;
pub mod llm;
pub mod model_selector;
pub mod place_retriever;
pub mod task_group;
pub mod vertex_search_service;
