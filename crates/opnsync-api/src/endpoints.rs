// Router API paths, relative to `/api/`.
//
// OPNsense uses a `{module}/{controller}/{command}[/{uuid}]` convention.

/// DHCPv4 static reservation endpoints.
pub mod dhcp {
    pub const SEARCH_RESERVATIONS: &str = "dhcpv4/leases/searchReservations";
    pub const ADD_RESERVATION: &str = "dhcpv4/leases/addReservation";
    pub const RECONFIGURE: &str = "dhcpv4/service/reconfigure";

    /// `searchReservations`, optionally scoped to one interface.
    pub fn search_reservations(interface: Option<&str>) -> String {
        match interface.filter(|i| !i.is_empty()) {
            Some(iface) => {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(iface.as_bytes()).collect();
                format!("{SEARCH_RESERVATIONS}?interface={encoded}")
            }
            None => SEARCH_RESERVATIONS.to_owned(),
        }
    }

    pub fn get_reservation(uuid: &str) -> String {
        format!("dhcpv4/leases/getReservation/{uuid}")
    }

    pub fn set_reservation(uuid: &str) -> String {
        format!("dhcpv4/leases/setReservation/{uuid}")
    }

    pub fn del_reservation(uuid: &str) -> String {
        format!("dhcpv4/leases/delReservation/{uuid}")
    }
}

/// Firewall alias endpoints.
pub mod alias {
    pub const SEARCH_ITEM: &str = "firewall/alias/searchItem";
    pub const ADD_ITEM: &str = "firewall/alias/addItem";
    pub const RECONFIGURE: &str = "firewall/alias/reconfigure";

    pub fn get_item(uuid: &str) -> String {
        format!("firewall/alias/getItem/{uuid}")
    }

    pub fn set_item(uuid: &str) -> String {
        format!("firewall/alias/setItem/{uuid}")
    }

    pub fn del_item(uuid: &str) -> String {
        format!("firewall/alias/delItem/{uuid}")
    }
}
