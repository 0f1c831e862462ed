use std::sync::Arc;

use axum::http::StatusCode;
use scholaris_core::AppError;
use scholaris_models::class_rooms::{ClassRoomFilterParams, CreateClassRoomDto, UpdateClassRoomDto};
use scholaris_models::users::User;
use serde_json::json;
use uuid::Uuid;

use super::service::ClassRoomService;
use crate::api::{ExposedRoute, HttpExposed, Outcome, Payload, expose, success_transformer};
use crate::middleware::ids::{AUTHENTICATION, PARAMS, QUERY, SCHOOL_ADMINISTRATOR};
use crate::modules::school_admins::service::SchoolAdminService;
use crate::state::AppState;

/// Class rooms are managed by the administrators of the owning school.
pub struct ClassRoomsManager {
    state: AppState,
}

impl ClassRoomsManager {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn class_room_id(payload: &Payload) -> Result<Uuid, AppError> {
        payload.param_as("classRoomId", "Invalid class room id")
    }

    async fn create_class_room(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let dto: CreateClassRoomDto = payload.validated("Invalid class room data")?;
        let caller: User = payload.middleware(AUTHENTICATION)?;

        SchoolAdminService::ensure_school_admin(&self.state.db, caller.id, dto.school_id).await?;
        let class_room = ClassRoomService::create_class_room(&self.state.db, dto, caller.id).await?;

        success_transformer(
            "Class room created successfully",
            &json!({ "classRoom": class_room }),
            Some(StatusCode::CREATED),
        )
    }

    async fn update_class_room(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let class_room_id = Self::class_room_id(&payload)?;
        let dto: UpdateClassRoomDto = payload.validated("Invalid class room data")?;
        let caller: User = payload.middleware(AUTHENTICATION)?;

        SchoolAdminService::ensure_school_admin(&self.state.db, caller.id, dto.school_id).await?;
        let class_room =
            ClassRoomService::update_class_room(&self.state.db, class_room_id, dto).await?;

        success_transformer(
            "Class room updated successfully",
            &json!({ "classRoom": class_room }),
            None,
        )
    }

    async fn get_class_rooms(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let filters: ClassRoomFilterParams = payload.query("Invalid class room filters")?;
        let caller: User = payload.middleware(AUTHENTICATION)?;

        SchoolAdminService::ensure_school_admin(&self.state.db, caller.id, filters.school_id)
            .await?;
        let class_rooms = ClassRoomService::get_class_rooms(&self.state.db, filters).await?;

        success_transformer("Class rooms fetched successfully", &class_rooms, None)
    }

    async fn get_class_room(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let class_room_id = Self::class_room_id(&payload)?;
        let caller: User = payload.middleware(AUTHENTICATION)?;

        let class_room = ClassRoomService::get_class_room(&self.state.db, class_room_id).await?;
        SchoolAdminService::ensure_school_admin(&self.state.db, caller.id, class_room.school_id)
            .await?;

        success_transformer(
            "Class room fetched successfully",
            &json!({ "classRoom": class_room }),
            None,
        )
    }

    async fn delete_class_room(self: Arc<Self>, payload: Payload) -> Result<Outcome, AppError> {
        let class_room_id = Self::class_room_id(&payload)?;
        let caller: User = payload.middleware(AUTHENTICATION)?;

        let class_room = ClassRoomService::get_class_room(&self.state.db, class_room_id).await?;
        SchoolAdminService::ensure_school_admin(&self.state.db, caller.id, class_room.school_id)
            .await?;
        ClassRoomService::delete_class_room(&self.state.db, class_room_id).await?;

        success_transformer("Class room deleted successfully", &json!({}), None)
    }
}

impl HttpExposed for ClassRoomsManager {
    fn module_name(&self) -> &'static str {
        "class-rooms"
    }

    fn http_exposed(self: Arc<Self>) -> Vec<ExposedRoute> {
        vec![
            expose(
                &self,
                "post=index.createClassRoom",
                &[AUTHENTICATION, SCHOOL_ADMINISTRATOR],
                Self::create_class_room,
            ),
            expose(
                &self,
                "patch=updateClassRoom:classRoomId",
                &[AUTHENTICATION, SCHOOL_ADMINISTRATOR, PARAMS],
                Self::update_class_room,
            ),
            expose(
                &self,
                "get=index.getClassRooms",
                &[AUTHENTICATION, SCHOOL_ADMINISTRATOR, QUERY],
                Self::get_class_rooms,
            ),
            expose(
                &self,
                "get=getClassRoom:classRoomId",
                &[AUTHENTICATION, SCHOOL_ADMINISTRATOR, PARAMS],
                Self::get_class_room,
            ),
            expose(
                &self,
                "delete=deleteClassRoom:classRoomId",
                &[AUTHENTICATION, SCHOOL_ADMINISTRATOR, PARAMS],
                Self::delete_class_room,
            ),
        ]
    }
}
