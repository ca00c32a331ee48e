//! IPv6 link-scope address helpers used by Neighbor Discovery.

use crate::Eui64;
use std::net::Ipv6Addr;

/// Link-scope all-nodes multicast group (ff02::1).
pub const ALL_NODES_MULTICAST: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 1);

/// Returns true for any multicast address (ff00::/8).
#[inline]
pub fn is_multicast(addr: &Ipv6Addr) -> bool {
    addr.octets()[0] == 0xff
}

/// Returns true for a unicast link-local address (fe80::/10).
#[inline]
pub fn is_link_local(addr: &Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}

/// Solicited-node multicast group for `target`: ff02::1:ffXX:XXXX, where the
/// low 24 bits are copied from the target (RFC 4291 section 2.7.1).
pub fn solicited_node_multicast(target: &Ipv6Addr) -> Ipv6Addr {
    let t = target.octets();
    let mut group = [0u8; 16];
    group[0] = 0xff;
    group[1] = 0x02;
    group[11] = 0x01;
    group[12] = 0xff;
    group[13..].copy_from_slice(&t[13..]);
    Ipv6Addr::from(group)
}

/// Returns true if `group` is the solicited-node multicast group of `target`.
#[inline]
pub fn is_solicited_node_for(group: &Ipv6Addr, target: &Ipv6Addr) -> bool {
    *group == solicited_node_multicast(target)
}

/// Link-local address fe80::/64 formed from the EUI-64 interface identifier.
pub fn link_local_from_eui64(eui: &Eui64) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    octets[0] = 0xfe;
    octets[1] = 0x80;
    octets[8..].copy_from_slice(&eui.interface_id());
    Ipv6Addr::from(octets)
}
